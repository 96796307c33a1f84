//! Axum handlers and the state they share.

pub mod api;
pub mod health;

pub use api::{
    correlation_handler, dashboard_handler, filters_handler, fuel_handler, metrics_handler,
    overview_handler, prices_handler, vehicles_handler, FilterParams,
};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;

use super::{NetworkConfig, ShutdownController};
use crate::service::QueryService;

/// Cloned into every handler; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Memoizing query layer over the vehicle store.
    pub service: Arc<QueryService>,
    pub shutdown: Arc<ShutdownController>,
    pub config: Arc<NetworkConfig>,
    /// Process start, for `uptime_secs`.
    pub start_time: Instant,
    /// Renders `/metrics`; `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(service: Arc<QueryService>, config: NetworkConfig) -> Self {
        Self {
            service,
            shutdown: Arc::new(ShutdownController::new()),
            config: Arc::new(config),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
