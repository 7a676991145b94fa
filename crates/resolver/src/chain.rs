//! Fallback-chain execution: the core resolution state machine.
//!
//! Per resolution call the chain moves Pending → Attempting(route_i) →
//! Succeeded | Attempting(route_{i+1}) → Succeeded | Exhausted. Routes are
//! attempted strictly in declared order (Direct, Proxy, Mock); one failure
//! advances immediately. No retry within a route; the caller's next
//! request after cache expiry is the retry.

use std::future::Future;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use forest_common::{Category, FetchCause, MonitorError, MonitorResult, ProviderError, Route};

use crate::capability::Capability;

/// Per-attempt timeouts are short so a single unreachable upstream cannot
/// stall the whole chain.
pub const DIRECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const PROXY_TIMEOUT: Duration = Duration::from_secs(8);
const MOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// One step of a fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub route: Route,
    pub timeout: Duration,
}

/// Build the chain for one category from its current capability. Rebuilt on
/// every resolution call so configuration changes take effect immediately.
pub fn build_chain(capability: &Capability) -> Vec<Attempt> {
    let mut attempts = Vec::new();

    if capability.can_call_direct {
        attempts.push(Attempt {
            route: Route::Direct,
            timeout: DIRECT_TIMEOUT,
        });
    }
    if capability.can_call_via_proxy {
        attempts.push(Attempt {
            route: Route::Proxy,
            timeout: PROXY_TIMEOUT,
        });
    }
    if !capability.live_only {
        attempts.push(Attempt {
            route: Route::Mock,
            timeout: MOCK_TIMEOUT,
        });
    }

    attempts
}

/// A successful resolution: the records plus the provenance of the route
/// that produced them.
#[derive(Debug, Clone)]
pub struct Resolution<T> {
    pub records: T,
    pub source: String,
    pub route: Route,
}

/// Drive one chain to completion.
///
/// `op` maps a route to one attempt; its result is `(source_tag, records)`.
/// Losing the per-attempt timeout race drops the attempt future, which
/// cancels any in-flight request. With the Mock route present the chain
/// always completes; exhaustion without it yields `ResolutionFailed`.
pub async fn run_chain<T, F, Fut>(
    category: Category,
    attempts: &[Attempt],
    mut op: F,
) -> MonitorResult<Resolution<T>>
where
    F: FnMut(Route) -> Fut,
    Fut: Future<Output = Result<(String, T), ProviderError>>,
{
    for attempt in attempts {
        debug!(%category, route = %attempt.route, timeout = ?attempt.timeout, "attempting route");

        let error = match tokio::time::timeout(attempt.timeout, op(attempt.route)).await {
            Ok(Ok((source, records))) => {
                counter!(
                    "resolver_attempts_total",
                    "category" => category.as_str(),
                    "route" => route_label(attempt.route),
                    "outcome" => "ok"
                )
                .increment(1);

                return Ok(Resolution {
                    records,
                    source,
                    route: attempt.route,
                });
            }
            Ok(Err(provider_error)) => provider_error,
            Err(_) => ProviderError::new(
                category,
                attempt.route,
                FetchCause::Timeout(attempt.timeout),
            ),
        };

        counter!(
            "resolver_attempts_total",
            "category" => category.as_str(),
            "route" => route_label(attempt.route),
            "outcome" => "error"
        )
        .increment(1);
        counter!("resolver_fallbacks_total", "category" => category.as_str()).increment(1);

        warn!(%category, route = %attempt.route, error = %error, "route failed, advancing chain");
    }

    Err(MonitorError::ResolutionFailed { category })
}

/// Await every subtask outcome, success or failure, preserving input order.
/// Failures become `None` so the caller can backfill exactly the shortfall.
pub async fn join_settled<T, Fut>(tasks: Vec<Fut>) -> Vec<Option<T>>
where
    Fut: Future<Output = Result<T, ProviderError>>,
{
    futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|outcome| match outcome {
            Ok(value) => Some(value),
            Err(error) => {
                debug!(error = %error, "parallel subtask dropped");
                None
            }
        })
        .collect()
}

fn route_label(route: Route) -> &'static str {
    match route {
        Route::Direct => "direct",
        Route::Proxy => "proxy",
        Route::Mock => "mock",
    }
}
