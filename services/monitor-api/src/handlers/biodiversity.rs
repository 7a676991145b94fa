//! Biodiversity endpoint.

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::response::Response;
use serde::Deserialize;

use providers::BiodiversityQuery;
use resolver::RequestOptions;

use super::{envelope_response, no_mock_flag};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BiodiversityParams {
    pub region: Option<String>,
    pub limit: Option<usize>,
    pub no_mock: Option<String>,
}

/// GET /biodiversity?region&limit
pub async fn biodiversity_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<BiodiversityParams>,
) -> Response {
    let defaults = BiodiversityQuery::default();
    let query = BiodiversityQuery {
        region: params.region.unwrap_or(defaults.region),
        limit: params.limit.unwrap_or(defaults.limit),
    };

    let result = state
        .service
        .get_species(
            &query,
            RequestOptions {
                no_mock: no_mock_flag(params.no_mock.as_deref()),
            },
        )
        .await;
    envelope_response(result)
}
