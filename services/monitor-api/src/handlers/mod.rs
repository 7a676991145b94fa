//! Request handlers for the proxy surface.

pub mod alerts;
pub mod biodiversity;
pub mod health;
pub mod regions;
pub mod satellite;
pub mod weather;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use forest_common::{MonitorError, MonitorResult};
use providers::Envelope;
use resolver::Fetched;

/// Wrap a resolution outcome in the wire envelope. Failures keep the
/// envelope shape so callers never have to parse two formats.
pub fn envelope_response<T: Serialize>(result: MonitorResult<Fetched<T>>) -> Response {
    match result {
        Ok(fetched) => {
            Json(Envelope::ok(fetched.data, fetched.source)).into_response()
        }
        Err(error) => {
            let status = StatusCode::from_u16(error.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(Envelope::<T>::failure(error.to_string()))).into_response()
        }
    }
}

/// Reject a request missing a required parameter, in envelope form.
pub fn missing_parameter<T: Serialize>(name: &str) -> Response {
    let error = MonitorError::Configuration(format!("missing required parameter: {}", name));
    (
        StatusCode::BAD_REQUEST,
        Json(Envelope::<T>::failure(error.to_string())),
    )
        .into_response()
}

/// The wire form of the live-only veto: `no_mock=1` (or `true`).
pub fn no_mock_flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("1") | Some("true"))
}
