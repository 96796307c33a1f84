//! HTTP surface of the dashboard: routes, middleware, health and shutdown.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod shutdown;

pub use config::NetworkConfig;
pub use error::ApiError;
pub use handlers::AppState;
pub use module::{build_router, NetworkModule};
pub use shutdown::{HealthState, InFlightGuard, ShutdownController};
