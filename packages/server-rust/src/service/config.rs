/// Query-service configuration.
///
/// Controls memoization of aggregation results.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum cached results per query kind. 0 disables caching entirely,
    /// including the filter-option snapshot.
    pub cache_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub fn caching_enabled(&self) -> bool {
        self.cache_capacity > 0
    }
}
