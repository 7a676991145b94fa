//! Current-weather endpoint.

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::response::Response;
use serde::Deserialize;

use forest_common::Weather;
use providers::WeatherQuery;
use resolver::RequestOptions;

use super::{envelope_response, missing_parameter, no_mock_flag};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub no_mock: Option<String>,
}

/// GET /weather?lat&lng
pub async fn weather_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Response {
    let Some(lat) = params.lat else {
        return missing_parameter::<Weather>("lat");
    };
    let Some(lng) = params.lng else {
        return missing_parameter::<Weather>("lng");
    };

    let result = state
        .service
        .get_weather(
            &WeatherQuery { lat, lng },
            RequestOptions {
                no_mock: no_mock_flag(params.no_mock.as_deref()),
            },
        )
        .await;
    envelope_response(result)
}
