//! Satellite tile metadata endpoint.

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::response::Response;
use serde::Deserialize;

use forest_common::Imagery;
use providers::ImageryQuery;
use resolver::RequestOptions;

use super::{envelope_response, missing_parameter, no_mock_flag};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SatelliteParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub layer: Option<String>,
    pub no_mock: Option<String>,
}

/// GET /satellite-data?lat&lng&layer
pub async fn satellite_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SatelliteParams>,
) -> Response {
    let Some(lat) = params.lat else {
        return missing_parameter::<Vec<Imagery>>("lat");
    };
    let Some(lng) = params.lng else {
        return missing_parameter::<Vec<Imagery>>("lng");
    };

    let query = ImageryQuery {
        lat,
        lng,
        layer: params.layer.unwrap_or_default(),
    };

    let result = state
        .service
        .get_satellite(
            &query,
            RequestOptions {
                no_mock: no_mock_flag(params.no_mock.as_deref()),
            },
        )
        .await;
    envelope_response(result)
}
