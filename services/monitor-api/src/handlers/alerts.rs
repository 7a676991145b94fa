//! Fire and deforestation alert endpoints.

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::response::Response;
use serde::Deserialize;

use providers::AlertQuery;
use resolver::RequestOptions;

use super::{envelope_response, no_mock_flag};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AlertParams {
    pub region: Option<String>,
    pub days: Option<u32>,
    pub limit: Option<usize>,
    pub no_mock: Option<String>,
}

impl AlertParams {
    fn to_query(&self) -> AlertQuery {
        let defaults = AlertQuery::default();
        AlertQuery {
            region: self.region.clone().unwrap_or(defaults.region),
            days: self.days.unwrap_or(defaults.days),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }

    fn options(&self) -> RequestOptions {
        RequestOptions {
            no_mock: no_mock_flag(self.no_mock.as_deref()),
        }
    }
}

/// GET /fire-alerts?region&days
pub async fn fire_alerts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AlertParams>,
) -> Response {
    let result = state
        .service
        .get_fire_alerts(&params.to_query(), params.options())
        .await;
    envelope_response(result)
}

/// GET /deforestation-alerts?region&days&limit
pub async fn deforestation_alerts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<AlertParams>,
) -> Response {
    let result = state
        .service
        .get_deforestation_alerts(&params.to_query(), params.options())
        .await;
    envelope_response(result)
}
