use async_trait::async_trait;
use carlens_core::{
    CorrelationRow, FilterOptions, FuelDistribution, OverviewStats, PriceRow, VehicleFilter,
    VehicleRow,
};

/// Read-only access to the vehicle listing collection.
/// Implementations: `MongoDB` (production), memory (tests and demos).
///
/// Every query flattens the embedded brand relation before applying the
/// filter, so one vehicle with several matching brand entries contributes
/// one row per matching entry. Errors are returned as-is; degrading them to
/// empty results is the caller's policy, not the store's.
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    /// Liveness check against the backing store.
    async fn ping(&self) -> anyhow::Result<()>;

    /// Year bounds and sorted distinct brand names over the whole collection.
    ///
    /// Fails with [`StoreError::Empty`](crate::storage::StoreError::Empty)
    /// when there is nothing to derive options from.
    async fn filter_options(&self) -> anyhow::Result<FilterOptions>;

    /// Row count, mean price, mean horsepower and distinct brand count.
    async fn overview(&self, filter: &VehicleFilter) -> anyhow::Result<OverviewStats>;

    /// One `(brand, price)` pair per matched row.
    async fn price_distribution(&self, filter: &VehicleFilter) -> anyhow::Result<Vec<PriceRow>>;

    /// Count and mean price per fuel category.
    async fn fuel_distribution(&self, filter: &VehicleFilter)
        -> anyhow::Result<FuelDistribution>;

    /// Price and specification columns per matched row.
    async fn correlation_rows(&self, filter: &VehicleFilter)
        -> anyhow::Result<Vec<CorrelationRow>>;

    /// Every matched row with all table columns.
    async fn vehicle_rows(&self, filter: &VehicleFilter) -> anyhow::Result<Vec<VehicleRow>>;
}
