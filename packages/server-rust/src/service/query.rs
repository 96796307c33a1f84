//! Memoizing query service with the uniform degrade-to-empty failure policy.
//!
//! Callers never see a query error: a failing store call is logged with its
//! full error chain and replaced by the empty value of the result type.
//! Only successful results are cached, so a transient failure is retried on
//! the next request.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;
use carlens_core::{
    CorrelationRow, FilterOptions, FuelDistribution, OverviewStats, PriceRow, VehicleFilter,
    VehicleRow,
};
use metrics::{counter, histogram};
use tracing::{debug, error, info_span, warn, Instrument};

use super::cache::QueryCache;
use super::config::ServiceConfig;
use crate::traits::VehicleStore;

/// Runs the dashboard queries against a shared [`VehicleStore`].
///
/// One instance lives for the whole process and is handed to the HTTP
/// layer through `AppState`.
pub struct QueryService {
    store: Arc<dyn VehicleStore>,
    config: ServiceConfig,
    options: ArcSwapOption<FilterOptions>,
    overview: QueryCache<OverviewStats>,
    prices: QueryCache<Arc<Vec<PriceRow>>>,
    fuel: QueryCache<FuelDistribution>,
    correlation: QueryCache<Arc<Vec<CorrelationRow>>>,
    vehicles: QueryCache<Arc<Vec<VehicleRow>>>,
}

impl QueryService {
    #[must_use]
    pub fn new(store: Arc<dyn VehicleStore>, config: ServiceConfig) -> Self {
        let capacity = config.cache_capacity;
        Self {
            store,
            config,
            options: ArcSwapOption::empty(),
            overview: QueryCache::new("overview", capacity),
            prices: QueryCache::new("price_distribution", capacity),
            fuel: QueryCache::new("fuel_distribution", capacity),
            correlation: QueryCache::new("correlation", capacity),
            vehicles: QueryCache::new("vehicle_table", capacity),
        }
    }

    /// The store this service reads from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn VehicleStore> {
        &self.store
    }

    /// Year bounds and brand choices for the filter widgets.
    ///
    /// Resolved once and reused while caching is enabled. On failure, or
    /// when the collection is empty, returns [`FilterOptions::fallback`]
    /// so the dashboard stays renderable; the fallback is not cached.
    pub async fn filter_options(&self) -> FilterOptions {
        if let Some(options) = self.options.load_full() {
            return options.as_ref().clone();
        }

        let span = info_span!("query", query = "filter_options");
        match self.store.filter_options().instrument(span).await {
            Ok(options) => {
                if self.config.caching_enabled() {
                    self.options.store(Some(Arc::new(options.clone())));
                }
                options
            }
            Err(err) => {
                counter!("carlens_query_failures_total", "query" => "filter_options").increment(1);
                error!(
                    backend = self.store.backend(),
                    error = ?err,
                    "filter options query failed, using fallback options"
                );
                FilterOptions::fallback()
            }
        }
    }

    pub async fn overview(&self, filter: &VehicleFilter) -> OverviewStats {
        run_cached(&self.overview, filter, || self.store.overview(filter)).await
    }

    pub async fn price_distribution(&self, filter: &VehicleFilter) -> Arc<Vec<PriceRow>> {
        run_cached(&self.prices, filter, || async {
            self.store.price_distribution(filter).await.map(Arc::new)
        })
        .await
    }

    pub async fn fuel_distribution(&self, filter: &VehicleFilter) -> FuelDistribution {
        run_cached(&self.fuel, filter, || self.store.fuel_distribution(filter)).await
    }

    pub async fn correlation_rows(&self, filter: &VehicleFilter) -> Arc<Vec<CorrelationRow>> {
        run_cached(&self.correlation, filter, || async {
            self.store.correlation_rows(filter).await.map(Arc::new)
        })
        .await
    }

    pub async fn vehicle_rows(&self, filter: &VehicleFilter) -> Arc<Vec<VehicleRow>> {
        run_cached(&self.vehicles, filter, || async {
            self.store.vehicle_rows(filter).await.map(Arc::new)
        })
        .await
    }

    /// Number of memoized results across all query kinds.
    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.overview.len()
            + self.prices.len()
            + self.fuel.len()
            + self.correlation.len()
            + self.vehicles.len()
            + usize::from(self.options.load().is_some())
    }

    /// Forgets every memoized result, including the filter options.
    pub fn clear_caches(&self) {
        self.options.store(None);
        self.overview.clear();
        self.prices.clear();
        self.fuel.clear();
        self.correlation.clear();
        self.vehicles.clear();
        debug!("query caches cleared");
    }
}

/// Serves `filter` from `cache`, or runs `query` and applies the failure policy.
async fn run_cached<V, F, Fut>(cache: &QueryCache<V>, filter: &VehicleFilter, query: F) -> V
where
    V: Clone + Default,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<V>>,
{
    if let Some(hit) = cache.get(filter) {
        return hit;
    }

    let name = cache.query();
    if filter.years.is_degenerate() {
        warn!(query = name, filter = %filter, "year range is inverted, no vehicle can match");
    }

    let span = info_span!("query", query = name, filter = %filter);
    let start = Instant::now();
    let result = query().instrument(span).await;
    histogram!("carlens_query_duration_seconds", "query" => name)
        .record(start.elapsed().as_secs_f64());

    match result {
        Ok(value) => {
            counter!("carlens_queries_total", "query" => name).increment(1);
            cache.insert(filter.clone(), value.clone());
            value
        }
        Err(err) => {
            counter!("carlens_query_failures_total", "query" => name).increment(1);
            error!(
                query = name,
                filter = %filter,
                error = ?err,
                "query failed, serving empty result"
            );
            V::default()
        }
    }
}
