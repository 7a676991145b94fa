//! Proxy-route client.
//!
//! When the execution context cannot reach an upstream directly, the chain
//! routes through the forest-watch HTTP surface (§ proxy boundary). This
//! client speaks that surface's `{success, data, source, error?}` envelope;
//! the same [`Envelope`] type is what the service serializes on the other
//! side, so the two ends cannot drift apart.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use forest_common::{
    Alert, Category, FetchCause, Imagery, ProviderError, Region, Route, Species, Weather,
};

use crate::http::HttpFetch;
use crate::params::{AlertQuery, BiodiversityQuery, ImageryQuery, WeatherQuery};

/// Wire envelope for every proxy endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, source: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            source: source.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            source: String::new(),
            error: Some(error.into()),
        }
    }
}

pub struct ProxyClient {
    http: Arc<dyn HttpFetch>,
    base_url: String,
}

impl ProxyClient {
    pub fn new(http: Arc<dyn HttpFetch>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn fire_alerts(
        &self,
        query: &AlertQuery,
        no_mock: bool,
    ) -> Result<(String, Vec<Alert>), ProviderError> {
        let path = format!(
            "/fire-alerts?region={}&days={}{}",
            query.region,
            query.days,
            no_mock_param(no_mock)
        );
        self.get_envelope(Category::Fire, &path).await
    }

    pub async fn deforestation_alerts(
        &self,
        query: &AlertQuery,
        no_mock: bool,
    ) -> Result<(String, Vec<Alert>), ProviderError> {
        let path = format!(
            "/deforestation-alerts?region={}&days={}&limit={}{}",
            query.region,
            query.days,
            query.limit,
            no_mock_param(no_mock)
        );
        self.get_envelope(Category::Deforestation, &path).await
    }

    pub async fn weather(
        &self,
        query: &WeatherQuery,
        no_mock: bool,
    ) -> Result<(String, Weather), ProviderError> {
        let path = format!(
            "/weather?lat={}&lng={}{}",
            query.lat,
            query.lng,
            no_mock_param(no_mock)
        );
        self.get_envelope(Category::Weather, &path).await
    }

    pub async fn forest_regions(
        &self,
        no_mock: bool,
    ) -> Result<(String, Vec<Region>), ProviderError> {
        let path = if no_mock {
            "/forest-regions?no_mock=1"
        } else {
            "/forest-regions"
        };
        self.get_envelope(Category::Deforestation, path).await
    }

    pub async fn biodiversity(
        &self,
        query: &BiodiversityQuery,
        no_mock: bool,
    ) -> Result<(String, Vec<Species>), ProviderError> {
        let path = format!(
            "/biodiversity?region={}&limit={}{}",
            query.region,
            query.limit,
            no_mock_param(no_mock)
        );
        self.get_envelope(Category::Biodiversity, &path).await
    }

    pub async fn satellite(
        &self,
        query: &ImageryQuery,
        no_mock: bool,
    ) -> Result<(String, Vec<Imagery>), ProviderError> {
        let path = format!(
            "/satellite-data?lat={}&lng={}&layer={}{}",
            query.lat,
            query.lng,
            query.layer,
            no_mock_param(no_mock)
        );
        self.get_envelope(Category::Satellite, &path).await
    }

    /// GET a proxy path and unwrap its envelope. Any failure (transport,
    /// malformed envelope, or `success: false`) is a `ProviderError` on
    /// the Proxy route so the chain advances.
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        category: Category,
        path_and_query: &str,
    ) -> Result<(String, T), ProviderError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let raw = self
            .http
            .get_text(&url)
            .await
            .map_err(|cause| ProviderError::new(category, Route::Proxy, cause))?;

        let envelope: Envelope<T> = serde_json::from_str(&raw).map_err(|e| {
            ProviderError::new(
                category,
                Route::Proxy,
                FetchCause::ProxyRejected(format!("malformed envelope: {}", e)),
            )
        })?;

        if !envelope.success {
            return Err(ProviderError::new(
                category,
                Route::Proxy,
                FetchCause::ProxyRejected(
                    envelope.error.unwrap_or_else(|| "unspecified".to_string()),
                ),
            ));
        }

        match envelope.data {
            Some(data) => Ok((envelope.source, data)),
            None => Err(ProviderError::new(
                category,
                Route::Proxy,
                FetchCause::ProxyRejected("success without data".to_string()),
            )),
        }
    }
}

fn no_mock_param(no_mock: bool) -> &'static str {
    if no_mock {
        "&no_mock=1"
    } else {
        ""
    }
}
