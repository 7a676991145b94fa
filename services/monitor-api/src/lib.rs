//! Forest-watch HTTP surface.
//!
//! Exposes the data-resolution facade as the proxy boundary: one GET
//! endpoint per category, each wrapped in the `{success, data, source,
//! error?}` envelope, plus health, readiness, and metrics.

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod handlers;
pub mod state;

use state::AppState;

/// Build the service router with its middleware stack.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/fire-alerts", get(handlers::alerts::fire_alerts_handler))
        .route(
            "/deforestation-alerts",
            get(handlers::alerts::deforestation_alerts_handler),
        )
        .route("/weather", get(handlers::weather::weather_handler))
        .route(
            "/forest-regions",
            get(handlers::regions::forest_regions_handler),
        )
        .route(
            "/biodiversity",
            get(handlers::biodiversity::biodiversity_handler),
        )
        .route(
            "/satellite-data",
            get(handlers::satellite::satellite_handler),
        )
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
