//! Top-level server configuration and store construction.

use std::sync::Arc;

use tracing::info;

use crate::logging::LogFormat;
use crate::network::NetworkConfig;
use crate::service::ServiceConfig;
use crate::storage::{MemoryVehicleStore, StoreBackend, StoreConfig, StoreError};
use crate::traits::VehicleStore;

/// Default HTTP port of the dashboard.
pub const DEFAULT_PORT: u16 = 8501;

/// Everything the binary needs to run one server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub network: NetworkConfig,
    pub service: ServiceConfig,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            network: NetworkConfig {
                port: DEFAULT_PORT,
                ..NetworkConfig::default()
            },
            service: ServiceConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

/// Opens the configured backend and checks that it answers.
///
/// # Errors
///
/// - [`StoreError::Unreachable`] when `MongoDB` does not answer the ping
/// - [`StoreError::Seed`] when the memory seed file cannot be read
/// - [`StoreError::Disabled`] when `MongoDB` is selected but not compiled in
pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn VehicleStore>, StoreError> {
    match &config.backend {
        StoreBackend::Memory { seed } => {
            let store = match seed {
                Some(path) => MemoryVehicleStore::from_json_file(path)?,
                None => MemoryVehicleStore::new(),
            };
            info!(vehicles = store.len(), "using in-memory vehicle store");
            Ok(Arc::new(store))
        }
        #[cfg(feature = "mongodb")]
        StoreBackend::Mongo => {
            let store = crate::storage::MongoVehicleStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongodb"))]
        StoreBackend::Mongo => Err(StoreError::Disabled("mongodb")),
    }
}
