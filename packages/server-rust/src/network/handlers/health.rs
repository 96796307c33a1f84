//! Health, liveness and readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::network::HealthState;

/// Detailed health as JSON, including a live ping of the vehicle store.
///
/// Always 200; `state` and `store` carry the verdict so monitoring can tell
/// "up but draining" or "up but store unreachable" from "down".
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = state.service.store();
    let store_status = match store.ping().await {
        Ok(()) => "up",
        Err(err) => {
            warn!(backend = store.backend(), error = ?err, "store ping failed");
            "down"
        }
    };

    Json(json!({
        "state": state.shutdown.health_state().as_str(),
        "backend": store.backend(),
        "store": store_status,
        "in_flight": state.shutdown.in_flight_count(),
        "cached_entries": state.service.cached_entries(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Always 200 while the process answers at all.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// 200 only in the `Ready` state, 503 while starting or draining.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::network::NetworkConfig;
    use crate::service::query::tests::{scenario_store, FailingStore};
    use crate::service::{QueryService, ServiceConfig};
    use crate::traits::VehicleStore;

    fn state_with(store: Arc<dyn VehicleStore>) -> AppState {
        let service = QueryService::new(store, ServiceConfig::default());
        AppState::new(Arc::new(service), NetworkConfig::default())
    }

    fn test_state() -> AppState {
        state_with(Arc::new(scenario_store()))
    }

    #[tokio::test]
    async fn health_reports_all_fields() {
        let state = test_state();
        state.shutdown.set_ready();

        let json = health_handler(State(state)).await.0;
        assert_eq!(json["state"], "ready");
        assert_eq!(json["backend"], "memory");
        assert_eq!(json["store"], "up");
        assert_eq!(json["in_flight"], 0);
        assert_eq!(json["cached_entries"], 0);
        assert!(json["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn health_reports_unreachable_store() {
        let state = state_with(Arc::new(FailingStore::default()));
        let json = health_handler(State(state)).await.0;
        assert_eq!(json["state"], "starting");
        assert_eq!(json["store"], "down");
    }

    #[tokio::test]
    async fn health_reports_in_flight_requests() {
        let state = test_state();
        let _guard = state.shutdown.in_flight_guard();
        let json = health_handler(State(state)).await.0;
        assert_eq!(json["in_flight"], 1);
    }

    #[tokio::test]
    async fn liveness_is_always_ok() {
        assert_eq!(liveness_handler().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_follows_lifecycle() {
        let state = test_state();
        assert_eq!(
            readiness_handler(State(state.clone())).await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.shutdown.set_ready();
        assert_eq!(readiness_handler(State(state.clone())).await, StatusCode::OK);

        state.shutdown.trigger_shutdown();
        assert_eq!(
            readiness_handler(State(state)).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
