//! `carlens` server: vehicle-listing dashboard over a document store.
//!
//! Aggregation queries run against a [`VehicleStore`] (`MongoDB` or in
//! memory), are memoized per filter by the [`QueryService`] and served as
//! JSON by the axum [`NetworkModule`].

pub mod config;
pub mod logging;
pub mod network;
pub mod service;
pub mod storage;
pub mod traits;

pub use config::{connect_store, AppConfig};
pub use logging::{init_tracing, LogFormat};
pub use network::NetworkModule;
pub use service::QueryService;
pub use traits::VehicleStore;
