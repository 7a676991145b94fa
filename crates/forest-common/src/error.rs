//! Error types for forest-watch services.

use std::time::Duration;

use thiserror::Error;

use crate::category::{Category, Route};

/// Result type alias using MonitorError.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Why a single provider attempt failed. Network faults, non-2xx statuses,
/// and timeouts are all normalized here so the chain executor can treat
/// them uniformly.
#[derive(Debug, Clone, Error)]
pub enum FetchCause {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("proxy reported failure: {0}")]
    ProxyRejected(String),
}

/// A failed attempt against one upstream via one route.
///
/// Always recoverable: the chain executor responds by advancing to the
/// next route.
#[derive(Debug, Clone, Error)]
#[error("{category} provider unavailable via {route}: {cause}")]
pub struct ProviderError {
    pub category: Category,
    pub route: Route,
    pub cause: FetchCause,
}

impl ProviderError {
    pub fn new(category: Category, route: Route, cause: FetchCause) -> Self {
        Self {
            category,
            route,
            cause,
        }
    }
}

/// Primary error type for resolution operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Every route in the chain was exhausted with the mock route removed
    /// (live-only mode). Surfaced to the caller, never silently swallowed.
    #[error("no live source could satisfy {category} (live-only mode)")]
    ResolutionFailed { category: Category },

    /// Malformed stored credential or flag. Treated as "capability absent"
    /// at resolution time, not fatal.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl MonitorError {
    /// HTTP status the proxy surface maps this error to.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MonitorError::Provider(_) => 502,
            MonitorError::ResolutionFailed { .. } => 503,
            MonitorError::Configuration(_) => 500,
        }
    }
}
