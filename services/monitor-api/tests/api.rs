//! Router-level tests: envelope shape, the no_mock veto on the wire, and
//! the health surface.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use forest_common::FetchCause;
use monitor_api::state::AppState;
use providers::HttpFetch;
use resolver::{CapabilityManager, ExecutionContext, ForestDataService, Settings};

struct UnreachableFetch;

#[async_trait]
impl HttpFetch for UnreachableFetch {
    async fn get_text(&self, _url: &str) -> Result<String, FetchCause> {
        Err(FetchCause::Network("no network in tests".to_string()))
    }
}

fn test_router(settings: Settings) -> axum::Router {
    let capability = Arc::new(CapabilityManager::new(settings, ExecutionContext::server()));
    let service = ForestDataService::new(capability.clone(), Arc::new(UnreachableFetch));
    let state = Arc::new(AppState::new(service, capability, None));
    monitor_api::build_router(state)
}

async fn get_json(
    app: &axum::Router,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_fire_alerts_envelope_falls_back_to_mock() {
    let app = test_router(Settings::default());
    let (status, body) = get_json(&app, "/fire-alerts?region=world&days=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["source"], "mock-fallback");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_no_mock_wire_param_vetoes_fallback() {
    let app = test_router(Settings::default());
    let (status, body) = get_json(&app, "/fire-alerts?region=world&days=1&no_mock=1").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("live-only"));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_weather_requires_coordinates() {
    let app = test_router(Settings::default());
    let (status, body) = get_json(&app, "/weather?lng=-62.2").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("lat"));
}

#[tokio::test]
async fn test_weather_envelope_carries_single_record() {
    let app = test_router(Settings::default());
    let (status, body) = get_json(&app, "/weather?lat=-3.4&lng=-62.2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["fire_weather_index"].is_number());
}

#[tokio::test]
async fn test_biodiversity_and_satellite_endpoints() {
    let app = test_router(Settings::default());

    let (status, body) = get_json(&app, "/biodiversity?region=amazon&limit=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = get_json(&app, "/satellite-data?lat=0.0&lng=20.0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "mock-fallback");

    let (status, body) = get_json(&app, "/forest-regions").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_reports_configured_providers() {
    let app = test_router(Settings {
        firms_map_key: Some("key".to_string()),
        ..Settings::default()
    });
    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"]["firms"], true);
    assert_eq!(body["providers"]["openweather"], false);
    assert_eq!(body["providers"]["gbif"], true);
    assert_eq!(body["live_only"], false);
}

#[tokio::test]
async fn test_ready_and_absent_metrics() {
    let app = test_router(Settings::default());

    let (status, body) = get_json(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    // No recorder installed in tests.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
