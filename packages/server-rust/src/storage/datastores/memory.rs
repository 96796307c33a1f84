//! In-process [`VehicleStore`] backed by a `Vec<Vehicle>`.
//!
//! Evaluates every query with the reference aggregations in
//! `carlens_core::aggregate`. Useful for tests, demos without a database,
//! and as the behavioural baseline for the `MongoDB` pipelines.

use std::path::Path;

use async_trait::async_trait;
use carlens_core::{
    aggregate, CorrelationRow, FilterOptions, FuelDistribution, OverviewStats, PriceRow, Vehicle,
    VehicleFilter, VehicleRow,
};
use parking_lot::RwLock;

use crate::storage::error::StoreError;
use crate::traits::VehicleStore;

/// Vehicle listings held in memory.
///
/// Reads take a shared lock and snapshot the matching rows; the store is
/// only written while seeding.
#[derive(Debug, Default)]
pub struct MemoryVehicleStore {
    vehicles: RwLock<Vec<Vehicle>>,
}

impl MemoryVehicleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vehicles(vehicles: Vec<Vehicle>) -> Self {
        Self {
            vehicles: RwLock::new(vehicles),
        }
    }

    /// Parses a JSON array of vehicle documents.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not an array of vehicle documents.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let vehicles: Vec<Vehicle> = serde_json::from_str(json)?;
        Ok(Self::from_vehicles(vehicles))
    }

    /// Loads a JSON array of vehicle documents from disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Seed`] if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let seed_error = |reason: String| StoreError::Seed {
            path: path.display().to_string(),
            reason,
        };
        let json = std::fs::read_to_string(path).map_err(|e| seed_error(e.to_string()))?;
        Self::from_json(&json).map_err(|e| seed_error(e.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn insert(&self, vehicle: Vehicle) {
        self.vehicles.write().push(vehicle);
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<Vehicle> {
        self.vehicles.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.read().is_empty()
    }

    fn matching(&self, filter: &VehicleFilter) -> Vec<VehicleRow> {
        aggregate::matching_rows(self.vehicles.read().iter(), filter)
    }
}

#[async_trait]
impl VehicleStore for MemoryVehicleStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn filter_options(&self) -> anyhow::Result<FilterOptions> {
        aggregate::filter_options(self.vehicles.read().iter())
            .ok_or_else(|| StoreError::Empty.into())
    }

    async fn overview(&self, filter: &VehicleFilter) -> anyhow::Result<OverviewStats> {
        Ok(aggregate::overview(&self.matching(filter)))
    }

    async fn price_distribution(&self, filter: &VehicleFilter) -> anyhow::Result<Vec<PriceRow>> {
        Ok(aggregate::price_distribution(&self.matching(filter)))
    }

    async fn fuel_distribution(
        &self,
        filter: &VehicleFilter,
    ) -> anyhow::Result<FuelDistribution> {
        Ok(aggregate::fuel_distribution(&self.matching(filter)))
    }

    async fn correlation_rows(
        &self,
        filter: &VehicleFilter,
    ) -> anyhow::Result<Vec<CorrelationRow>> {
        Ok(aggregate::correlation_rows(&self.matching(filter)))
    }

    async fn vehicle_rows(&self, filter: &VehicleFilter) -> anyhow::Result<Vec<VehicleRow>> {
        Ok(self.matching(filter))
    }
}

#[cfg(test)]
mod tests {
    use carlens_core::{YearRange, UNKNOWN_FUEL};

    use super::*;

    fn scenario_store() -> MemoryVehicleStore {
        MemoryVehicleStore::from_vehicles(vec![
            Vehicle::new(2020, 20_000.0, ["Toyota"]).with_fuel("Petrol"),
            Vehicle::new(2021, 25_000.0, ["Honda"]),
            Vehicle::new(2022, 60_000.0, ["Toyota", "Lexus"]).with_fuel("Electric"),
        ])
    }

    fn filter(min: i32, max: i32, brands: &[&str]) -> VehicleFilter {
        VehicleFilter::new(YearRange::new(min, max), brands.iter().copied()).unwrap()
    }

    #[tokio::test]
    async fn overview_scenario_toyota() {
        let store = scenario_store();
        let stats = store.overview(&filter(2020, 2022, &["Toyota"])).await.unwrap();
        assert_eq!(stats.total_cars, 2);
        assert_eq!(stats.avg_price, 40_000.0);
    }

    #[tokio::test]
    async fn fuel_scenario_honda_unknown() {
        let store = scenario_store();
        let dist = store
            .fuel_distribution(&filter(2021, 2021, &["Honda"]))
            .await
            .unwrap();
        assert_eq!(dist.fuel_counts.len(), 1);
        assert_eq!(dist.fuel_counts[UNKNOWN_FUEL], 1);
        assert_eq!(dist.avg_prices[UNKNOWN_FUEL], 25_000.0);
    }

    #[tokio::test]
    async fn queries_are_idempotent() {
        let store = scenario_store();
        let f = filter(2020, 2022, &["Toyota", "Lexus", "Honda"]);

        assert_eq!(store.overview(&f).await.unwrap(), store.overview(&f).await.unwrap());
        assert_eq!(
            store.price_distribution(&f).await.unwrap(),
            store.price_distribution(&f).await.unwrap()
        );
        assert_eq!(
            store.vehicle_rows(&f).await.unwrap(),
            store.vehicle_rows(&f).await.unwrap()
        );
    }

    #[tokio::test]
    async fn filter_options_empty_store_is_an_error() {
        let store = MemoryVehicleStore::new();
        let err = store.filter_options().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Empty)));
    }

    #[tokio::test]
    async fn insert_makes_vehicle_visible() {
        let store = MemoryVehicleStore::new();
        assert!(store.is_empty());
        store.insert(Vehicle::new(2015, 9_000.0, ["Kia"]));

        assert_eq!(store.len(), 1);
        let options = store.filter_options().await.unwrap();
        assert_eq!(options.brands, vec!["Kia"]);
        assert_eq!((options.min_year, options.max_year), (2015, 2015));
    }

    #[test]
    fn from_json_parses_documents() {
        let json = r#"[{
            "year": 2018,
            "price": 15000,
            "brand": [{"name": "Ford"}],
            "fuelType": "Diesel"
        }]"#;
        let store = MemoryVehicleStore::from_json(json).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn from_json_file_reports_missing_file() {
        let err =
            MemoryVehicleStore::from_json_file(Path::new("/nonexistent/seed.json")).unwrap_err();
        assert!(matches!(err, StoreError::Seed { .. }));
    }

    #[tokio::test]
    async fn ping_always_succeeds() {
        assert!(MemoryVehicleStore::new().ping().await.is_ok());
        assert_eq!(MemoryVehicleStore::new().backend(), "memory");
    }
}
