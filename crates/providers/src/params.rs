//! Query parameter types and the static region/species tables.

use serde::{Deserialize, Serialize};

/// Query for fire or deforestation alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertQuery {
    /// Region id from [`MONITORED_REGIONS`], or "world".
    pub region: String,
    /// Lookback window in days.
    pub days: u32,
    /// Maximum rows requested from the upstream.
    pub limit: usize,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self {
            region: "world".to_string(),
            days: 1,
            limit: 100,
        }
    }
}

/// Query for current weather at a point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Query for species observations in a region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiodiversityQuery {
    pub region: String,
    pub limit: usize,
}

impl Default for BiodiversityQuery {
    fn default() -> Self {
        Self {
            region: "world".to_string(),
            limit: 5,
        }
    }
}

/// Query for satellite tile metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageryQuery {
    pub lat: f64,
    pub lng: f64,
    pub layer: String,
}

/// One monitored forest region.
#[derive(Debug, Clone, Copy)]
pub struct RegionInfo {
    pub id: &'static str,
    pub name: &'static str,
    /// ISO 3166-1 alpha-3 of the dominant country, for GFW grouping.
    pub iso: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub area_km2: f64,
}

/// The fixed set of forest regions the dashboard tracks.
pub const MONITORED_REGIONS: [RegionInfo; 6] = [
    RegionInfo {
        id: "amazon",
        name: "Amazon Basin",
        iso: "BRA",
        lat: -3.46,
        lng: -62.21,
        area_km2: 5_500_000.0,
    },
    RegionInfo {
        id: "congo",
        name: "Congo Basin",
        iso: "COD",
        lat: -0.23,
        lng: 21.76,
        area_km2: 3_700_000.0,
    },
    RegionInfo {
        id: "borneo",
        name: "Borneo Lowlands",
        iso: "IDN",
        lat: 0.96,
        lng: 114.55,
        area_km2: 743_000.0,
    },
    RegionInfo {
        id: "taiga",
        name: "Siberian Taiga",
        iso: "RUS",
        lat: 60.0,
        lng: 105.0,
        area_km2: 12_000_000.0,
    },
    RegionInfo {
        id: "daintree",
        name: "Daintree Rainforest",
        iso: "AUS",
        lat: -16.17,
        lng: 145.42,
        area_km2: 1_200.0,
    },
    RegionInfo {
        id: "valdivian",
        name: "Valdivian Temperate Forest",
        iso: "CHL",
        lat: -40.0,
        lng: -73.0,
        area_km2: 248_000.0,
    },
];

/// Species names polled against the biodiversity upstream.
pub const SPECIES_WATCHLIST: [&str; 8] = [
    "Panthera onca",
    "Pongo pygmaeus",
    "Harpia harpyja",
    "Gorilla beringei",
    "Ateles geoffroyi",
    "Dendrobates tinctorius",
    "Ramphastos toco",
    "Panthera tigris",
];

/// Look up a monitored region by id.
pub fn lookup_region(id: &str) -> Option<&'static RegionInfo> {
    MONITORED_REGIONS.iter().find(|r| r.id == id)
}

/// Bounding box string `west,south,east,north` for an area query.
pub fn region_bounds(region: &str) -> String {
    match lookup_region(region) {
        Some(info) => {
            // Half-degree-per-1000km box around the centroid, capped at the
            // valid lat/lng range.
            let half = (info.area_km2.sqrt() / 111.0 / 2.0).clamp(1.0, 30.0);
            format!(
                "{:.2},{:.2},{:.2},{:.2}",
                (info.lng - half).max(-180.0),
                (info.lat - half).max(-90.0),
                (info.lng + half).min(180.0),
                (info.lat + half).min(90.0)
            )
        }
        None => "-180,-90,180,90".to_string(),
    }
}

/// Centroid for a region id, world origin if unknown.
pub fn region_centroid(region: &str) -> (f64, f64) {
    lookup_region(region)
        .map(|r| (r.lat, r.lng))
        .unwrap_or((0.0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_bounds() {
        assert_eq!(region_bounds("world"), "-180,-90,180,90");
        assert_eq!(region_bounds("atlantis"), "-180,-90,180,90");
    }

    #[test]
    fn test_region_bounds_contain_centroid() {
        let bounds = region_bounds("amazon");
        let parts: Vec<f64> = bounds.split(',').map(|p| p.parse().unwrap()).collect();
        let info = lookup_region("amazon").unwrap();
        assert!(parts[0] < info.lng && info.lng < parts[2]);
        assert!(parts[1] < info.lat && info.lat < parts[3]);
    }

    #[test]
    fn test_lookup_region() {
        assert!(lookup_region("congo").is_some());
        assert!(lookup_region("unknown").is_none());
    }
}
