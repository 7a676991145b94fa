//! NASA GIBS satellite-imagery metadata adapter.
//!
//! GIBS serves tiles without authentication; the adapter fetches the layer
//! metadata document and yields an [`Imagery`] record carrying the WMTS
//! tile URL template for the requested point.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;

use forest_common::{Category, Imagery, ProviderError, Route};

use crate::http::HttpFetch;
use crate::params::ImageryQuery;

pub const SOURCE: &str = "nasa-gibs";
const DEFAULT_BASE: &str = "https://gibs.earthdata.nasa.gov";
pub const DEFAULT_LAYER: &str = "MODIS_Terra_CorrectedReflectance_TrueColor";

#[derive(Debug, Default, Deserialize)]
struct GibsLayerMeta {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "endDate")]
    end_date: Option<String>,
    #[serde(default, rename = "resolutionM")]
    resolution_m: Option<f64>,
}

pub struct GibsAdapter {
    http: Arc<dyn HttpFetch>,
    base_url: String,
}

impl GibsAdapter {
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

    /// Fetch the metadata document for one layer.
    pub async fn fetch(&self, query: &ImageryQuery) -> Result<String, ProviderError> {
        let layer = effective_layer(&query.layer);
        let url = format!("{}/layer-metadata/v1.0/{}.json", self.base_url, layer);

        self.http
            .get_text(&url)
            .await
            .map_err(|cause| ProviderError::new(Category::Satellite, Route::Direct, cause))
    }

    /// Parse layer metadata into a single imagery record. Total: garbage
    /// metadata still yields a record built from defaults, an empty payload
    /// yields none.
    pub fn parse(&self, raw: &str, query: &ImageryQuery) -> Vec<Imagery> {
        if raw.trim().is_empty() {
            return Vec::new();
        }
        let meta: GibsLayerMeta = serde_json::from_str(raw).unwrap_or_default();
        let layer = effective_layer(&query.layer);
        let date = meta
            .end_date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or_else(Utc::now);

        vec![Imagery {
            id: format!("{}-{}", layer, date.format("%Y-%m-%d")),
            layer: meta.title.unwrap_or_else(|| layer.to_string()),
            date,
            tile_url: self.tile_url_template(layer, date),
            resolution_m: meta.resolution_m.unwrap_or(250.0),
            source: SOURCE.to_string(),
        }]
    }

    /// WMTS REST tile template for a layer/date, `{z}/{y}/{x}` left for the
    /// map client to substitute.
    fn tile_url_template(&self, layer: &str, date: DateTime<Utc>) -> String {
        format!(
            "{}/wmts/epsg3857/best/{}/default/{}/GoogleMapsCompatible_Level9/{{z}}/{{y}}/{{x}}.jpg",
            self.base_url,
            layer,
            date.format("%Y-%m-%d")
        )
    }
}

fn effective_layer(requested: &str) -> &str {
    if requested.is_empty() {
        DEFAULT_LAYER
    } else {
        requested
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}
