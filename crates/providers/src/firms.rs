//! NASA FIRMS fire-detection adapter.
//!
//! Fetches active-fire detections as CSV from the FIRMS area API and
//! normalizes rows into fire [`Alert`]s. Severity is computed from fire
//! radiative power and detection confidence, never taken from the upstream.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use forest_common::{
    clamp_pct, fire_severity, Alert, Category, Coordinates, ProviderError, Route,
};

use crate::http::HttpFetch;
use crate::params::{region_bounds, AlertQuery};

pub const SOURCE: &str = "nasa-firms";
const DEFAULT_BASE: &str = "https://firms.modaps.eosdis.nasa.gov";
/// VIIRS on Suomi-NPP, near-real-time.
const SENSOR: &str = "VIIRS_SNPP_NRT";

/// One row of the FIRMS area CSV. Only the columns the system depends on;
/// extra columns are ignored, missing ones default.
#[derive(Debug, Deserialize)]
struct FirmsRow {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    acq_date: String,
    #[serde(default)]
    acq_time: String,
    /// Numeric for MODIS, l/n/h for VIIRS.
    #[serde(default)]
    confidence: String,
    #[serde(default)]
    frp: Option<f64>,
}

pub struct FirmsAdapter {
    http: Arc<dyn HttpFetch>,
    base_url: String,
}

impl FirmsAdapter {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE.to_string(),
        }
    }

    pub fn with_base_url(http: Arc<dyn HttpFetch>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch raw area CSV for the query window.
    pub async fn fetch(&self, query: &AlertQuery, map_key: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/api/area/csv/{}/{}/{}/{}",
            self.base_url,
            map_key,
            SENSOR,
            region_bounds(&query.region),
            query.days
        );

        self.http
            .get_text(&url)
            .await
            .map_err(|cause| ProviderError::new(Category::Fire, Route::Direct, cause))
    }

    /// Parse a FIRMS CSV payload. Total: malformed rows are skipped, a
    /// malformed or empty payload yields an empty list.
    pub fn parse(&self, raw: &str) -> Vec<Alert> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let mut alerts = Vec::new();
        for result in reader.deserialize::<FirmsRow>() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "skipping malformed FIRMS row");
                    continue;
                }
            };

            let confidence = clamp_pct(parse_confidence(&row.confidence));
            let frp = row.frp.unwrap_or(0.0);
            let severity = fire_severity(frp, confidence);
            let timestamp = parse_acquisition(&row.acq_date, &row.acq_time)
                .unwrap_or_else(Utc::now);

            let mut metadata = BTreeMap::new();
            metadata.insert("frp".to_string(), json!(frp));

            alerts.push(Alert {
                id: format!(
                    "fire-{:.4}-{:.4}-{}",
                    row.latitude,
                    row.longitude,
                    timestamp.timestamp()
                ),
                timestamp,
                location: format!("{:.2}, {:.2}", row.latitude, row.longitude),
                category: Category::Fire,
                severity,
                confidence,
                description: format!("Active fire detected (FRP {:.1} MW)", frp),
                coordinates: Coordinates::new(row.latitude, row.longitude),
                source: SOURCE.to_string(),
                metadata,
            });
        }

        alerts
    }
}

/// VIIRS reports confidence as l/n/h; MODIS as a number.
fn parse_confidence(raw: &str) -> f64 {
    match raw.trim() {
        "l" | "L" => 30.0,
        "n" | "N" => 60.0,
        "h" | "H" => 90.0,
        other => other.parse().unwrap_or(50.0),
    }
}

fn parse_acquisition(date: &str, time: &str) -> Option<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    // acq_time is HHMM, zero-padded to 4 digits upstream but not always.
    let padded = format!("{:0>4}", time.trim());
    let time = NaiveTime::parse_from_str(&padded, "%H%M").ok()?;
    Utc.from_utc_datetime(&date.and_time(time)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use forest_common::Severity;

    const SAMPLE: &str = "\
latitude,longitude,bright_ti4,scan,track,acq_date,acq_time,satellite,instrument,confidence,version,bright_ti5,frp,daynight
-3.4653,-62.2159,330.5,0.39,0.36,2024-01-15,0342,N,VIIRS,h,2.0NRT,295.2,60.3,N
-3.5100,-62.3000,312.1,0.41,0.37,2024-01-15,0342,N,VIIRS,n,2.0NRT,290.0,8.2,N
";

    fn adapter() -> FirmsAdapter {
        FirmsAdapter::new(Arc::new(crate::http::testing::NeverFetch))
    }

    #[test]
    fn test_parse_sample_rows() {
        let alerts = adapter().parse(SAMPLE);
        assert_eq!(alerts.len(), 2);

        let first = &alerts[0];
        assert_eq!(first.category, Category::Fire);
        assert_eq!(first.severity, Severity::Critical); // frp 60.3, conf 90
        assert_eq!(first.source, SOURCE);
        assert_eq!(first.confidence, 90.0);

        let second = &alerts[1];
        assert_eq!(second.severity, Severity::Low); // frp 8.2
    }

    #[test]
    fn test_parse_is_total() {
        assert!(adapter().parse("").is_empty());
        assert!(adapter().parse("not,a,firms\npayload").is_empty());
        assert!(adapter().parse("latitude,longitude\ngarbage,row").is_empty());
    }

    #[test]
    fn test_confidence_letters() {
        assert_eq!(parse_confidence("h"), 90.0);
        assert_eq!(parse_confidence("n"), 60.0);
        assert_eq!(parse_confidence("l"), 30.0);
        assert_eq!(parse_confidence("85"), 85.0);
        assert_eq!(parse_confidence("junk"), 50.0);
    }

    #[test]
    fn test_acquisition_timestamp() {
        let ts = parse_acquisition("2024-01-15", "342").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-15T03:42:00+00:00");
        assert!(parse_acquisition("bad", "0342").is_none());
    }
}
