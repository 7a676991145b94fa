//! Health, readiness, and metrics handlers.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use forest_common::Category;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub live_only: bool,
    pub providers: ProviderStatus,
}

/// Which provider credentials are configured. Consumed by the UI to
/// disclose which categories can serve live data.
#[derive(Serialize)]
pub struct ProviderStatus {
    pub firms: bool,
    pub openweather: bool,
    pub gfw: bool,
    pub gbif: bool,
    pub gibs: bool,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

/// GET /health
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    let settings = state.capability.settings();

    Json(HealthResponse {
        status: "ok".to_string(),
        live_only: state.capability.is_live_only(),
        providers: ProviderStatus {
            firms: settings.firms_map_key.is_some(),
            openweather: settings.openweather_api_key.is_some(),
            gfw: settings.gfw_api_key.is_some(),
            // Keyless upstreams are always available to call.
            gbif: state.capability.has_credential(Category::Biodiversity),
            gibs: state.capability.has_credential(Category::Satellite),
        },
    })
}

/// GET /ready
pub async fn ready_handler() -> Json<ReadyResponse> {
    Json(ReadyResponse { ready: true })
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(handle.render().into())
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
