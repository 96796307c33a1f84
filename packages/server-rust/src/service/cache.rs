//! Per-query memoization keyed by [`VehicleFilter`].
//!
//! The filter's brand set is a `BTreeSet`, so the same brands selected in a
//! different order resolve to the same entry.

use carlens_core::VehicleFilter;
use metrics::counter;
use quick_cache::sync::Cache;

/// Bounded cache of one query kind's results.
///
/// A capacity of 0 yields a pass-through cache that never stores anything.
pub struct QueryCache<V> {
    query: &'static str,
    inner: Option<Cache<VehicleFilter, V>>,
}

impl<V: Clone> QueryCache<V> {
    #[must_use]
    pub fn new(query: &'static str, capacity: usize) -> Self {
        Self {
            query,
            inner: (capacity > 0).then(|| Cache::new(capacity)),
        }
    }

    /// Name of the query whose results this cache holds.
    #[must_use]
    pub fn query(&self) -> &'static str {
        self.query
    }

    pub fn get(&self, filter: &VehicleFilter) -> Option<V> {
        let cache = self.inner.as_ref()?;
        let hit = cache.get(filter);
        let outcome = if hit.is_some() { "hit" } else { "miss" };
        counter!("carlens_cache_lookups_total", "query" => self.query, "outcome" => outcome)
            .increment(1);
        hit
    }

    pub fn insert(&self, filter: VehicleFilter, value: V) {
        if let Some(cache) = &self.inner {
            cache.insert(filter, value);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |cache| cache.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.clear();
        }
    }
}
