//! Synthetic data generators, the terminal element of every fallback chain.
//!
//! Generators are pure and synchronous: they cannot fail, which is what
//! guarantees chain termination when mocks are permitted. Values are driven
//! by an FNV-1a hash of the request parameters rather than an RNG, so
//! repeated calls with the same inputs agree and tests stay stable. All
//! values fall inside each field's documented range.

use std::collections::BTreeMap;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;

use forest_common::{
    clamp_pct, fire_weather_index, Alert, Category, Coordinates, Imagery, Region, Severity,
    Species, SpeciesStatus, Weather,
};

use crate::gfw::region_from_counts;
use crate::params::{region_centroid, ImageryQuery, MONITORED_REGIONS, SPECIES_WATCHLIST};

/// Source tag carried by every synthetic record.
pub const SOURCE: &str = "mock-fallback";

/// Alerts produced per category when a chain falls all the way through.
pub const FALLBACK_ALERT_COUNT: usize = 2;

pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const SEVERITIES: [Severity; 4] = [
    Severity::Low,
    Severity::Medium,
    Severity::High,
    Severity::Critical,
];

const STATUSES: [SpeciesStatus; 4] = [
    SpeciesStatus::Stable,
    SpeciesStatus::Declining,
    SpeciesStatus::CriticallyEndangered,
    SpeciesStatus::Recovering,
];

const DESCRIPTIONS: [&str; 4] = [
    "clear sky",
    "scattered clouds",
    "light rain",
    "overcast",
];

#[derive(Debug, Default, Clone)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Synthetic alerts for one category around a region centroid.
    pub fn alerts(&self, category: Category, region: &str, count: usize) -> Vec<Alert> {
        let (lat, lng) = region_centroid(region);

        (0..count)
            .map(|i| {
                let seed = fnv1a(format!("{}:{}:{}", category, region, i).as_bytes());
                let severity = SEVERITIES[(seed % 4) as usize];
                let confidence = 60.0 + (seed % 41) as f64;
                let jitter_lat = ((seed % 200) as f64 - 100.0) / 100.0;
                let jitter_lng = ((seed / 7 % 200) as f64 - 100.0) / 100.0;
                let timestamp = Utc::now() - ChronoDuration::minutes((seed % 720) as i64);

                let mut metadata = BTreeMap::new();
                metadata.insert("synthetic".to_string(), json!(true));

                Alert {
                    id: format!("mock-{}-{}-{}", category, region, i),
                    timestamp,
                    location: region.to_string(),
                    category,
                    severity,
                    confidence: clamp_pct(confidence),
                    description: format!("Simulated {} activity", category),
                    coordinates: Coordinates::new(
                        (lat + jitter_lat).clamp(-90.0, 90.0),
                        (lng + jitter_lng).clamp(-180.0, 180.0),
                    ),
                    source: SOURCE.to_string(),
                    metadata,
                }
            })
            .collect()
    }

    /// Region summaries with a plausible spread of alert levels.
    pub fn regions(&self) -> Vec<Region> {
        MONITORED_REGIONS
            .iter()
            .map(|info| {
                let pseudo_alerts = fnv1a(info.id.as_bytes()) % 150;
                region_from_counts(info, pseudo_alerts, SOURCE)
            })
            .collect()
    }

    /// Synthetic species drawn from the watchlist.
    pub fn species(&self, count: usize) -> Vec<Species> {
        (0..count)
            .map(|i| {
                let name = SPECIES_WATCHLIST[i % SPECIES_WATCHLIST.len()];
                self.species_named(name)
            })
            .collect()
    }

    /// One synthetic species record for a scientific name. Used to backfill
    /// parallel-join shortfalls so the caller still receives the requested
    /// number of results.
    pub fn species_named(&self, scientific_name: &str) -> Species {
        let seed = fnv1a(scientific_name.as_bytes());
        let status = STATUSES[(seed % 4) as usize];

        Species {
            id: format!("mock-species-{}", seed % 1_000_000),
            name: scientific_name
                .split_whitespace()
                .next()
                .unwrap_or(scientific_name)
                .to_string(),
            scientific_name: scientific_name.to_string(),
            status,
            population: 500 + seed % 80_000,
            trend_pct_per_year: match status {
                SpeciesStatus::Stable => 0.1,
                SpeciesStatus::Recovering => 2.0,
                SpeciesStatus::Declining => -3.0,
                SpeciesStatus::CriticallyEndangered => -7.5,
            },
            habitat: "forest".to_string(),
            last_seen: Utc::now() - ChronoDuration::days((seed % 45) as i64),
            confidence: clamp_pct(60.0 + (seed % 41) as f64),
            threat_level: SEVERITIES[(seed % 4) as usize],
            source: SOURCE.to_string(),
        }
    }

    /// Synthetic current conditions at a point.
    pub fn weather(&self, lat: f64, lng: f64) -> Weather {
        let seed = fnv1a(format!("weather:{:.2}:{:.2}", lat, lng).as_bytes());
        let temperature = 18.0 + (seed % 15) as f64;
        let humidity = 40.0 + (seed % 51) as f64;
        let precipitation = (seed % 20) as f64 / 2.0;

        Weather {
            temperature_c: temperature,
            humidity_pct: clamp_pct(humidity),
            precipitation_mm: precipitation,
            wind_speed: (seed % 12) as f64,
            pressure: 990.0 + (seed % 40) as f64,
            cloud_cover_pct: clamp_pct((seed % 101) as f64),
            fire_weather_index: fire_weather_index(temperature, humidity, precipitation),
            location: format!("{:.2}, {:.2}", lat, lng),
            description: DESCRIPTIONS[(seed % 4) as usize].to_string(),
            source: SOURCE.to_string(),
        }
    }

    /// Synthetic imagery metadata mirroring the GIBS record shape.
    pub fn imagery(&self, query: &ImageryQuery) -> Vec<Imagery> {
        let layer = if query.layer.is_empty() {
            crate::gibs::DEFAULT_LAYER
        } else {
            &query.layer
        };
        let date = Utc::now();

        vec![Imagery {
            id: format!("mock-{}-{}", layer, date.format("%Y-%m-%d")),
            layer: layer.to_string(),
            date,
            tile_url: format!(
                "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best/{}/default/{}/GoogleMapsCompatible_Level9/{{z}}/{{y}}/{{x}}.jpg",
                layer,
                date.format("%Y-%m-%d")
            ),
            resolution_m: 250.0,
            source: SOURCE.to_string(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alerts_within_ranges() {
        let generator = MockGenerator::new();
        let alerts = generator.alerts(Category::Fire, "amazon", 20);
        assert_eq!(alerts.len(), 20);

        for alert in &alerts {
            assert!(alert.confidence >= 60.0 && alert.confidence <= 100.0);
            assert!(alert.coordinates.lat >= -90.0 && alert.coordinates.lat <= 90.0);
            assert_eq!(alert.source, SOURCE);
        }

        // 20 hashed seeds should hit more than one severity level.
        let distinct: std::collections::BTreeSet<_> =
            alerts.iter().map(|a| a.severity).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_alerts_deterministic() {
        let generator = MockGenerator::new();
        let a = generator.alerts(Category::Deforestation, "congo", 3);
        let b = generator.alerts(Category::Deforestation, "congo", 3);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.severity, y.severity);
            assert_eq!(x.confidence, y.confidence);
        }
    }

    #[test]
    fn test_regions_cover_table() {
        let regions = MockGenerator::new().regions();
        assert_eq!(regions.len(), MONITORED_REGIONS.len());
        for region in &regions {
            assert!(region.health_score >= 0.0 && region.health_score <= 100.0);
            assert_eq!(region.source, SOURCE);
        }
    }

    #[test]
    fn test_species_backfill_named() {
        let generator = MockGenerator::new();
        let species = generator.species_named("Panthera onca");
        assert_eq!(species.scientific_name, "Panthera onca");
        assert_eq!(species.source, SOURCE);
        assert!(species.confidence >= 60.0 && species.confidence <= 100.0);
        // Stable across calls.
        assert_eq!(species.population, generator.species_named("Panthera onca").population);
    }

    #[test]
    fn test_weather_index_consistent_with_fields() {
        let weather = MockGenerator::new().weather(-3.46, -62.21);
        let expected = fire_weather_index(
            weather.temperature_c,
            weather.humidity_pct,
            weather.precipitation_mm,
        );
        assert_eq!(weather.fire_weather_index, expected);
    }

    #[test]
    fn test_imagery_uses_default_layer() {
        let query = ImageryQuery {
            lat: 0.0,
            lng: 0.0,
            layer: String::new(),
        };
        let imagery = MockGenerator::new().imagery(&query);
        assert_eq!(imagery[0].layer, crate::gibs::DEFAULT_LAYER);
    }
}
