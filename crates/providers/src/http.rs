//! HTTP transport abstraction used by every adapter.
//!
//! Adapters depend on the [`HttpFetch`] trait rather than a concrete client
//! so unit tests can supply canned payloads or scripted failures. The
//! production implementation wraps a shared `reqwest` client.

use std::time::Duration;

use async_trait::async_trait;
use forest_common::FetchCause;
use reqwest::Client;
use tracing::debug;

/// Minimal GET-for-text transport. Non-2xx statuses and connection faults
/// are both reported as [`FetchCause`] so adapters never see raw transport
/// errors.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, FetchCause>;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    /// Build the shared client. The request timeout here is a backstop; the
    /// chain executor applies its own, shorter, per-attempt timeout.
    pub fn new(request_timeout: Duration) -> Result<Self, FetchCause> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| FetchCause::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Default for ReqwestFetch {
    fn default() -> Self {
        // Builder only fails on TLS backend misconfiguration.
        Self::new(Duration::from_secs(30)).expect("HTTP client construction failed")
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get_text(&self, url: &str) -> Result<String, FetchCause> {
        debug!(url = %url, "upstream GET");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchCause::Timeout(Duration::from_secs(30))
            } else {
                FetchCause::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchCause::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchCause::Network(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Transport that always fails with a network error.
    pub struct NeverFetch;

    #[async_trait]
    impl HttpFetch for NeverFetch {
        async fn get_text(&self, _url: &str) -> Result<String, FetchCause> {
            Err(FetchCause::Network("no transport in tests".to_string()))
        }
    }

    /// Transport that returns the same payload for every URL.
    pub struct StaticFetch(pub String);

    #[async_trait]
    impl HttpFetch for StaticFetch {
        async fn get_text(&self, _url: &str) -> Result<String, FetchCause> {
            Ok(self.0.clone())
        }
    }
}
