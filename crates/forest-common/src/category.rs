//! Data categories, resolution routes, and severity levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical category of environmental data. Every resolution request,
/// cache TTL class, and fallback chain is keyed by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fire,
    Deforestation,
    Weather,
    Biodiversity,
    Satellite,
}

impl Category {
    /// All categories, in the order the facade reports them.
    pub const ALL: [Category; 5] = [
        Category::Fire,
        Category::Deforestation,
        Category::Weather,
        Category::Biodiversity,
        Category::Satellite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fire => "fire",
            Category::Deforestation => "deforestation",
            Category::Weather => "weather",
            Category::Biodiversity => "biodiversity",
            Category::Satellite => "satellite",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a resolution attempt reaches its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// The process calls the upstream itself.
    Direct,
    /// A server-side intermediary makes the call.
    Proxy,
    /// Synthetic data, no network.
    Mock,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Direct => f.write_str("direct"),
            Route::Proxy => f.write_str("proxy"),
            Route::Mock => f.write_str("mock"),
        }
    }
}

/// Alert severity / region alert level. Always computed by the threshold
/// functions in [`crate::severity`], never passed through from an upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Population status of a tracked species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesStatus {
    Stable,
    Declining,
    CriticallyEndangered,
    Recovering,
}
