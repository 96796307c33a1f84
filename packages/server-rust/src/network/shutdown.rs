//! Server lifecycle state and draining of in-flight dashboard queries.
//!
//! Every `/api` request passes through [`track_in_flight`], which counts it
//! for the duration of its store queries and turns it away once shutdown
//! has begun. The serve loop then waits on [`ShutdownController::wait_for_drain`],
//! which wakes as soon as the last counted request finishes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Notify;

use super::error::ApiError;

/// Lifecycle of the dashboard server: `Starting -> Ready -> Draining -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Store connected, listener not yet accepting.
    Starting,
    /// Serving dashboard requests.
    Ready,
    /// Shutdown requested; waiting for in-flight queries.
    Draining,
    /// Every in-flight request finished.
    Stopped,
}

impl HealthState {
    /// Lowercase name used in the `/health` body.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }

    /// `/api` requests are refused once shutdown has begun.
    #[must_use]
    pub fn accepts_queries(self) -> bool {
        matches!(self, Self::Starting | Self::Ready)
    }
}

#[derive(Debug, Default)]
struct InFlight {
    count: AtomicU64,
    idle: Notify,
}

/// Shared by the serve loop, the `/api` middleware and the health handlers.
#[derive(Debug)]
pub struct ShutdownController {
    state: ArcSwap<HealthState>,
    in_flight: Arc<InFlight>,
}

impl ShutdownController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(HealthState::Starting),
            in_flight: Arc::default(),
        }
    }

    pub fn set_ready(&self) {
        self.state.store(Arc::new(HealthState::Ready));
    }

    /// Moves to `Draining`; readiness fails and new queries are refused.
    pub fn trigger_shutdown(&self) {
        self.state.store(Arc::new(HealthState::Draining));
    }

    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.state.load()
    }

    /// Counts one request as in flight until the guard drops.
    #[must_use]
    pub fn in_flight_guard(&self) -> InFlightGuard {
        self.in_flight.count.fetch_add(1, Ordering::AcqRel);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.count.load(Ordering::Acquire)
    }

    /// Waits until no request is in flight or `timeout` elapses.
    ///
    /// On success the state becomes `Stopped` and `true` is returned; on
    /// timeout the state stays `Draining`.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let idle = self.in_flight.idle.notified();
            tokio::pin!(idle);
            // Register before reading the count so a guard dropped in between
            // still wakes us.
            idle.as_mut().enable();

            if self.in_flight_count() == 0 {
                self.state.store(Arc::new(HealthState::Stopped));
                return true;
            }
            if tokio::time::timeout_at(deadline, idle).await.is_err() {
                return false;
            }
        }
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter on drop, unwinding included, and wakes
/// a pending drain when it was the last one.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.in_flight.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.in_flight.idle.notify_waiters();
        }
    }
}

/// Route layer for `/api`: 503 while draining, otherwise runs the handler
/// under an [`InFlightGuard`].
pub async fn track_in_flight(
    State(shutdown): State<Arc<ShutdownController>>,
    request: Request,
    next: Next,
) -> Response {
    if !shutdown.health_state().accepts_queries() {
        return ApiError::ShuttingDown.into_response();
    }
    let _guard = shutdown.in_flight_guard();
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn lifecycle_transitions() {
        let controller = ShutdownController::new();
        assert_eq!(controller.health_state(), HealthState::Starting);

        controller.set_ready();
        assert_eq!(controller.health_state(), HealthState::Ready);

        controller.trigger_shutdown();
        assert_eq!(controller.health_state(), HealthState::Draining);
        assert!(!controller.health_state().accepts_queries());
    }

    #[test]
    fn state_names() {
        assert_eq!(HealthState::Starting.as_str(), "starting");
        assert_eq!(HealthState::Stopped.as_str(), "stopped");
    }

    #[test]
    fn guards_track_in_flight_requests() {
        let controller = ShutdownController::new();
        let first = controller.in_flight_guard();
        let second = controller.in_flight_guard();
        assert_eq!(controller.in_flight_count(), 2);

        drop(first);
        assert_eq!(controller.in_flight_count(), 1);
        drop(second);
        assert_eq!(controller.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn drain_wakes_when_last_guard_drops() {
        let controller = ShutdownController::new();
        controller.set_ready();
        let guard = controller.in_flight_guard();
        controller.trigger_shutdown();

        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        assert!(controller.wait_for_drain(Duration::from_secs(2)).await);
        assert_eq!(controller.health_state(), HealthState::Stopped);
        release.await.unwrap();
    }

    #[tokio::test]
    async fn drain_times_out_while_query_is_running() {
        let controller = ShutdownController::new();
        let _guard = controller.in_flight_guard();
        controller.trigger_shutdown();

        assert!(!controller.wait_for_drain(Duration::from_millis(30)).await);
        assert_eq!(controller.health_state(), HealthState::Draining);
    }

    fn guarded_app(shutdown: &Arc<ShutdownController>) -> Router {
        let observed = Arc::clone(shutdown);
        Router::new()
            .route(
                "/api/count",
                get(move || async move { observed.in_flight_count().to_string() }),
            )
            .route_layer(axum::middleware::from_fn_with_state(
                Arc::clone(shutdown),
                track_in_flight,
            ))
    }

    async fn call(app: Router) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri("/api/count").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn middleware_counts_request_while_handler_runs() {
        let shutdown = Arc::new(ShutdownController::new());
        shutdown.set_ready();

        let (status, body) = call(guarded_app(&shutdown)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1");
        assert_eq!(shutdown.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn middleware_refuses_queries_while_draining() {
        let shutdown = Arc::new(ShutdownController::new());
        shutdown.set_ready();
        shutdown.trigger_shutdown();

        let (status, _) = call(guarded_app(&shutdown)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(shutdown.in_flight_count(), 0);
    }
}
