//! HTTP server lifecycle: `new()` wires state, `start()` binds, `serve()`
//! accepts until the shutdown future resolves.
//!
//! Binding before serving lets the binary report the actual port (port 0
//! picks an ephemeral one) and fail fast on an address already in use.

use std::future::Future;
use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    correlation_handler, dashboard_handler, filters_handler, fuel_handler, health_handler,
    liveness_handler, metrics_handler, overview_handler, prices_handler, readiness_handler,
    vehicles_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::{track_in_flight, ShutdownController};
use crate::service::QueryService;

/// Assembles every route and the middleware stack around `state`.
///
/// - `GET /api/filters`, `/api/overview`, `/api/prices`, `/api/fuel`,
///   `/api/correlation`, `/api/vehicles`, `/api/dashboard`, counted by
///   [`track_in_flight`] and refused while draining
/// - `GET /health`, `/health/live`, `/health/ready`
/// - `GET /metrics`
pub fn build_router(state: AppState) -> Router {
    let layers = build_http_layers(&state.config);
    let in_flight = from_fn_with_state(Arc::clone(&state.shutdown), track_in_flight);

    let api = Router::new()
        .route("/api/filters", get(filters_handler))
        .route("/api/overview", get(overview_handler))
        .route("/api/prices", get(prices_handler))
        .route("/api/fuel", get(fuel_handler))
        .route("/api/correlation", get(correlation_handler))
        .route("/api/vehicles", get(vehicles_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route_layer(in_flight);

    Router::new()
        .merge(api)
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .layer(layers)
        .with_state(state)
}

/// Owns the listener and the state shared with every handler.
pub struct NetworkModule {
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Wires the query service into the handler state without binding.
    #[must_use]
    pub fn new(config: NetworkConfig, service: Arc<QueryService>) -> Self {
        Self {
            listener: None,
            state: AppState::new(service, config),
        }
    }

    /// Serves `/metrics` from the given Prometheus recorder.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state = self.state.with_metrics(handle);
        self
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Binds the listener and returns the bound port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let address = self.state.config.bind_address();
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();

        info!(host = %self.state.config.host, port, "listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests for
    /// at most the configured drain timeout.
    ///
    /// Readiness flips to 503 as soon as `shutdown` resolves, before open
    /// connections finish.
    ///
    /// # Errors
    ///
    /// Returns an error if [`start`](Self::start) was not called first or
    /// the server hits a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.router();
        let controller = self.shutdown_controller();
        let drain_timeout = self.state.config.drain_timeout;
        let Some(listener) = self.listener else {
            anyhow::bail!("start() must be called before serve()");
        };

        controller.set_ready();
        info!("serving dashboard requests");

        let signal_controller = Arc::clone(&controller);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("shutdown signal received");
                signal_controller.trigger_shutdown();
            })
            .await?;

        if controller.wait_for_drain(drain_timeout).await {
            info!("all requests drained");
        } else {
            warn!(
                in_flight = controller.in_flight_count(),
                "drain timeout expired with requests still in flight"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use super::*;
    use crate::network::HealthState;
    use crate::service::query::tests::scenario_store;
    use crate::service::ServiceConfig;

    fn module() -> NetworkModule {
        let config = NetworkConfig {
            host: "127.0.0.1".to_string(),
            ..NetworkConfig::default()
        };
        let service = QueryService::new(Arc::new(scenario_store()), ServiceConfig::default());
        NetworkModule::new(config, Arc::new(service))
    }

    #[test]
    fn new_does_not_bind() {
        let module = module();
        assert!(module.listener.is_none());
        assert_eq!(module.shutdown_controller().health_state(), HealthState::Starting);
    }

    #[test]
    fn shutdown_controller_is_shared() {
        let module = module();
        assert!(Arc::ptr_eq(
            &module.shutdown_controller(),
            &module.shutdown_controller()
        ));
    }

    #[tokio::test]
    async fn start_binds_ephemeral_port() {
        let mut module = module();
        let port = module.start().await.unwrap();
        assert!(port > 0);
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    async fn serve_without_start_is_an_error() {
        let err = module()
            .serve(std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("start()"));
    }

    #[tokio::test]
    async fn serves_until_shutdown_then_stops() {
        let mut module = module();
        let port = module.start().await.unwrap();
        let controller = module.shutdown_controller();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(module.serve(async move {
            let _ = rx.await;
        }));

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = b"GET /health/ready HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
        stream.write_all(request).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(controller.health_state(), HealthState::Stopped);
    }
}
