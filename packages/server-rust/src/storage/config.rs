//! Store connection configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Which backend serves the vehicle collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// `MongoDB` at [`StoreConfig::uri`].
    Mongo,
    /// In-process store, optionally seeded from a JSON array of vehicle documents.
    Memory { seed: Option<PathBuf> },
}

/// Document store location and connection limits.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Connection string, e.g. `mongodb://localhost:27017/`.
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Upper bound on server selection, which bounds the startup liveness check.
    pub connect_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mongo,
            uri: "mongodb://localhost:27017/".to_string(),
            database: "car_db".to_string(),
            collection: "cars_joined".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    /// The connection string with any `user:password@` part masked, safe to log.
    #[must_use]
    pub fn redacted_uri(&self) -> String {
        let Some((scheme, rest)) = self.uri.split_once("://") else {
            return self.uri.clone();
        };
        let end = rest.find('/').unwrap_or(rest.len());
        let (authority, path) = rest.split_at(end);
        match authority.rfind('@') {
            Some(at) => format!("{scheme}://***@{}{path}", &authority[at + 1..]),
            None => self.uri.clone(),
        }
    }
}
