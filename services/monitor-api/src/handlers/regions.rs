//! Forest-region summary endpoint.

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::response::Response;
use serde::Deserialize;

use resolver::RequestOptions;

use super::{envelope_response, no_mock_flag};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegionParams {
    pub no_mock: Option<String>,
}

/// GET /forest-regions
pub async fn forest_regions_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<RegionParams>,
) -> Response {
    let result = state
        .service
        .get_regions(RequestOptions {
            no_mock: no_mock_flag(params.no_mock.as_deref()),
        })
        .await;
    envelope_response(result)
}
