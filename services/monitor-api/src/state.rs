//! Shared application state.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use resolver::{CapabilityManager, ForestDataService};

pub struct AppState {
    pub service: ForestDataService,
    pub capability: Arc<CapabilityManager>,
    /// Absent when no Prometheus recorder is installed (tests).
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        service: ForestDataService,
        capability: Arc<CapabilityManager>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            service,
            capability,
            metrics,
        }
    }
}
