//! Query execution and dashboard assembly.
//!
//! 1. **Caching** (`cache`): per-query memoization keyed by `VehicleFilter`
//! 2. **Queries** (`query`): store calls with timing, logging and the
//!    degrade-to-empty failure policy
//! 3. **Dashboard** (`dashboard`): filter resolution and the panel view model

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod query;

pub use cache::QueryCache;
pub use config::ServiceConfig;
pub use dashboard::{build_dashboard, resolve_filter, DashboardRequest, DashboardView};
pub use query::QueryService;
