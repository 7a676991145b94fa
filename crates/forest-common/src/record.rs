//! Canonical record shapes returned to callers regardless of which
//! upstream answered.
//!
//! Records are immutable value objects: constructed once by an adapter or
//! mock generator and never mutated afterward. Every record carries a
//! `source` tag identifying the provider (or mock) that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::category::{Category, Severity, SpeciesStatus};

/// WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A single environmental alert (fire, deforestation, biodiversity, or
/// weather derived).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Human-readable place name, e.g. "Amazon Basin".
    pub location: String,
    pub category: Category,
    pub severity: Severity,
    /// Detection confidence, clamped to [0, 100].
    pub confidence: f64,
    pub description: String,
    pub coordinates: Coordinates,
    pub source: String,
    /// Provider-specific extras (frp, alert counts, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Alert {
    /// Fresh id for upstream rows that carry none of their own.
    pub fn generate_id(category: Category) -> String {
        format!("{}-{}", category, Uuid::new_v4())
    }
}

/// Summary of one monitored forest region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
    /// Overall health, 0-100.
    pub health_score: f64,
    /// Annual loss, percent of cover.
    pub deforestation_rate: f64,
    /// Relative species richness, 0-100.
    pub biodiversity_index: f64,
    pub alert_level: Severity,
    pub area_km2: f64,
    pub forest_cover_pct: f64,
    pub fire_risk_index: f64,
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub last_update: DateTime<Utc>,
    pub source: String,
}

/// A tracked species and its population trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: String,
    pub name: String,
    pub scientific_name: String,
    pub status: SpeciesStatus,
    pub population: u64,
    pub trend_pct_per_year: f64,
    pub habitat: String,
    pub last_seen: DateTime<Utc>,
    /// Observation confidence, clamped to [0, 100].
    pub confidence: f64,
    pub threat_level: Severity,
    pub source: String,
}

/// Current weather conditions at a point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weather {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub precipitation_mm: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub cloud_cover_pct: f64,
    /// Composite dryness/heat/rain-deficit index, 0-100.
    pub fire_weather_index: f64,
    pub location: String,
    pub description: String,
    pub source: String,
}

/// Satellite tile metadata for one imagery layer at a point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imagery {
    pub id: String,
    pub layer: String,
    pub date: DateTime<Utc>,
    pub tile_url: String,
    pub resolution_m: f64,
    pub source: String,
}
