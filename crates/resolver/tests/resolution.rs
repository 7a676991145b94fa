//! End-to-end resolution tests against a scripted transport: fallback
//! totality, live-only strictness, the parallel-join backfill, and cache
//! behavior across configuration changes.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use forest_common::{Category, FetchCause, MonitorError};
use providers::{AlertQuery, BiodiversityQuery, HttpFetch, ImageryQuery, WeatherQuery};
use resolver::{CapabilityManager, ExecutionContext, ForestDataService, RequestOptions, Settings};

/// Transport that answers by URL substring and records every call.
struct ScriptedFetch {
    rules: Vec<(&'static str, Result<String, FetchCause>)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetch {
    fn new(rules: Vec<(&'static str, Result<String, FetchCause>)>) -> Arc<Self> {
        Arc::new(Self {
            rules,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Self::new(Vec::new())
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpFetch for ScriptedFetch {
    async fn get_text(&self, url: &str) -> Result<String, FetchCause> {
        self.calls.lock().unwrap().push(url.to_string());
        for (needle, outcome) in &self.rules {
            if url.contains(needle) {
                return outcome.clone();
            }
        }
        Err(FetchCause::Network("unreachable in tests".to_string()))
    }
}

fn keyed_settings(live_only: bool) -> Settings {
    Settings {
        firms_map_key: Some("test-map-key".to_string()),
        openweather_api_key: Some("test-ow-key".to_string()),
        gfw_api_key: None,
        live_only,
    }
}

fn service_with(
    settings: Settings,
    context: ExecutionContext,
    transport: Arc<ScriptedFetch>,
) -> (ForestDataService, Arc<CapabilityManager>) {
    let capability = Arc::new(CapabilityManager::new(settings, context));
    let service = ForestDataService::new(capability.clone(), transport);
    (service, capability)
}

/// FIRMS credential present but the upstream returns 500, the proxy is
/// down too, so the chain lands on the mock generator and the result is
/// cached.
#[tokio::test]
async fn test_fire_chain_exhausts_live_routes_and_lands_on_mock() {
    let transport = ScriptedFetch::new(vec![
        ("firms.modaps", Err(FetchCause::Status(500))),
        (
            "proxy.internal",
            Err(FetchCause::Network("connection refused".to_string())),
        ),
    ]);
    let context = ExecutionContext {
        can_call_direct: true,
        proxy_base: Some("http://proxy.internal".to_string()),
    };
    let (service, _) = service_with(keyed_settings(false), context, transport.clone());

    let query = AlertQuery {
        region: "world".to_string(),
        days: 1,
        limit: 100,
    };
    let fetched = service
        .get_fire_alerts(&query, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(fetched.source, "mock-fallback");
    assert_eq!(fetched.data.len(), 2);
    for alert in &fetched.data {
        assert_eq!(alert.source, "mock-fallback");
        assert_eq!(alert.category, Category::Fire);
    }

    // Direct then proxy were attempted, in that order.
    let calls_after_first = transport.call_count();
    assert_eq!(calls_after_first, 2);
    {
        let calls = transport.calls.lock().unwrap();
        assert!(calls[0].contains("firms.modaps"));
        assert!(calls[1].contains("proxy.internal"));
    }

    // The mock result was cached: a second request hits no route at all.
    let again = service
        .get_fire_alerts(&query, RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(again.data.len(), 2);
    assert_eq!(transport.call_count(), calls_after_first);
}

/// With live-only enabled and every route failing, resolution reports
/// failure, never mock data.
#[tokio::test]
async fn test_live_only_never_fabricates() {
    let (service, _) = service_with(
        keyed_settings(true),
        ExecutionContext::server(),
        ScriptedFetch::failing(),
    );

    let error = service
        .get_weather(
            &WeatherQuery { lat: -3.4, lng: -62.2 },
            RequestOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        MonitorError::ResolutionFailed {
            category: Category::Weather
        }
    ));

    // The merged feed degrades to empty rather than erroring out.
    let alerts = service
        .get_alerts(&AlertQuery::default(), RequestOptions::default())
        .await
        .unwrap();
    assert!(alerts.data.is_empty());
}

/// The per-request `no_mock` veto behaves like the global flag.
#[tokio::test]
async fn test_no_mock_option_vetoes_fallback() {
    let (service, _) = service_with(
        keyed_settings(false),
        ExecutionContext::server(),
        ScriptedFetch::failing(),
    );

    let error = service
        .get_fire_alerts(&AlertQuery::default(), RequestOptions { no_mock: true })
        .await
        .unwrap_err();
    assert!(matches!(error, MonitorError::ResolutionFailed { .. }));

    // Same request without the veto completes from the mock generator.
    let fetched = service
        .get_fire_alerts(&AlertQuery::default(), RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(fetched.source, "mock-fallback");
}

/// With mocks allowed, every category resolves to a non-empty, well-typed
/// result no matter how many routes fail.
#[tokio::test]
async fn test_fallback_totality_across_categories() {
    let (service, _) = service_with(
        keyed_settings(false),
        ExecutionContext::server(),
        ScriptedFetch::failing(),
    );
    let opts = RequestOptions::default();

    assert!(!service
        .get_alerts(&AlertQuery::default(), opts)
        .await
        .unwrap()
        .data
        .is_empty());
    assert!(!service.get_regions(opts).await.unwrap().data.is_empty());
    assert!(!service
        .get_species(&BiodiversityQuery::default(), opts)
        .await
        .unwrap()
        .data
        .is_empty());
    assert!(!service
        .get_satellite(
            &ImageryQuery {
                lat: 0.0,
                lng: 0.0,
                layer: String::new(),
            },
            opts
        )
        .await
        .unwrap()
        .data
        .is_empty());

    let weather = service
        .get_weather(&WeatherQuery { lat: 1.0, lng: 2.0 }, opts)
        .await
        .unwrap();
    assert_eq!(weather.source, "mock-fallback");
    assert!(weather.data.fire_weather_index >= 0.0);
}

const GBIF_JAGUAR: &str = r#"{"results":[{"key":1,"canonicalName":"Panthera onca",
    "scientificName":"Panthera onca","vernacularName":"Jaguar","threatStatus":"NEAR_THREATENED"}]}"#;
const GBIF_ORANGUTAN: &str = r#"{"results":[{"key":2,"canonicalName":"Pongo pygmaeus",
    "scientificName":"Pongo pygmaeus","threatStatus":"CRITICALLY_ENDANGERED"}]}"#;

/// 5 species requested, 2 live successes, 3 failures: exactly 5 results,
/// with the shortfall backfilled from the mock generator.
#[tokio::test]
async fn test_watchlist_join_backfills_shortfall() {
    let transport = ScriptedFetch::new(vec![
        ("Panthera%20onca", Ok(GBIF_JAGUAR.to_string())),
        ("Pongo%20pygmaeus", Ok(GBIF_ORANGUTAN.to_string())),
    ]);
    let (service, _) = service_with(
        Settings::default(),
        ExecutionContext::server(),
        transport,
    );

    let query = BiodiversityQuery {
        region: "world".to_string(),
        limit: 5,
    };
    let fetched = service
        .get_species(&query, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(fetched.data.len(), 5);
    let live = fetched.data.iter().filter(|s| s.source == "gbif").count();
    let mocked = fetched
        .data
        .iter()
        .filter(|s| s.source == "mock-fallback")
        .count();
    assert_eq!(live, 2);
    assert_eq!(mocked, 3);
}

/// In live-only mode the shortfall is not backfilled; only the live
/// successes come back.
#[tokio::test]
async fn test_watchlist_join_without_backfill_in_live_only() {
    let transport = ScriptedFetch::new(vec![
        ("Panthera%20onca", Ok(GBIF_JAGUAR.to_string())),
        ("Pongo%20pygmaeus", Ok(GBIF_ORANGUTAN.to_string())),
    ]);
    let (service, _) = service_with(
        Settings {
            live_only: true,
            ..Settings::default()
        },
        ExecutionContext::server(),
        transport,
    );

    let query = BiodiversityQuery {
        region: "world".to_string(),
        limit: 5,
    };
    let fetched = service
        .get_species(&query, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(fetched.data.len(), 2);
    assert!(fetched.data.iter().all(|s| s.source == "gbif"));
}

/// A configuration change invalidates every cache on the next call.
#[tokio::test]
async fn test_configuration_change_invalidates_caches() {
    let transport = ScriptedFetch::new(vec![(
        "openweathermap",
        Err(FetchCause::Status(503)),
    )]);
    let (service, capability) = service_with(
        keyed_settings(false),
        ExecutionContext::server(),
        transport.clone(),
    );

    let query = WeatherQuery { lat: 10.0, lng: 20.0 };
    let opts = RequestOptions::default();

    service.get_weather(&query, opts).await.unwrap();
    let after_first = transport.call_count();
    assert_eq!(after_first, 1);

    // Cached: no new upstream traffic.
    service.get_weather(&query, opts).await.unwrap();
    assert_eq!(transport.call_count(), after_first);

    // A credential change must drop the cached value.
    capability.update(|s| s.openweather_api_key = Some("rotated".to_string()));
    service.get_weather(&query, opts).await.unwrap();
    assert_eq!(transport.call_count(), after_first + 1);
}

/// The merged feed is sorted newest-first and bounded.
#[tokio::test]
async fn test_merged_alerts_sorted_and_bounded() {
    let (service, _) = service_with(
        keyed_settings(false),
        ExecutionContext::server(),
        ScriptedFetch::failing(),
    );

    let fetched = service
        .get_alerts(&AlertQuery::default(), RequestOptions::default())
        .await
        .unwrap();

    assert!(fetched.data.len() <= 25);
    for pair in fetched.data.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
    // All-routes-down means everything is provenance-tagged as synthetic.
    assert!(fetched.data.iter().all(|a| a.source == "mock-fallback"));
}
