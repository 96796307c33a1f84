//! Vehicle listing document model and its flattened row form.
//!
//! A [`Vehicle`] mirrors one document of the `cars_joined` collection. The
//! `brand` relation is embedded one-to-many, so every query that filters or
//! groups by brand works on [`VehicleRow`]s: one row per (vehicle, brand
//! entry) pair, produced by [`Vehicle::rows`].

use serde::{Deserialize, Serialize};

/// Category used for vehicles whose `fuelType` is missing or null.
pub const UNKNOWN_FUEL: &str = "Unknown";

/// One embedded brand entry of a vehicle document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandEntry {
    /// Brand name as stored, e.g. `"Toyota"`.
    pub name: String,
}

impl BrandEntry {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Technical specifications nested under `specifications`.
///
/// Every field is optional: listings frequently omit some of them, and
/// aggregates must skip absent values rather than count them as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specifications {
    #[serde(default)]
    pub horsepower: Option<f64>,
    #[serde(default)]
    pub torque: Option<f64>,
    #[serde(default)]
    pub engine_displacement: Option<f64>,
    #[serde(default)]
    pub mileage: Option<f64>,
}

/// A vehicle listing document.
///
/// `year` and `price` are always present. `fuel_type` may be absent or
/// null; both collapse into [`UNKNOWN_FUEL`] when grouped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub year: i32,
    pub price: f64,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub brand: Vec<BrandEntry>,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
}

impl Vehicle {
    /// Creates a vehicle with the required fields and no optional data.
    #[must_use]
    pub fn new<I, S>(year: i32, price: f64, brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            year,
            price,
            fuel_type: None,
            brand: brands.into_iter().map(BrandEntry::new).collect(),
            specifications: Specifications::default(),
            model: None,
            color: None,
            transmission: None,
        }
    }

    #[must_use]
    pub fn with_fuel(mut self, fuel: impl Into<String>) -> Self {
        self.fuel_type = Some(fuel.into());
        self
    }

    #[must_use]
    pub fn with_specifications(mut self, specifications: Specifications) -> Self {
        self.specifications = specifications;
        self
    }

    /// Fuel category used for grouping.
    #[must_use]
    pub fn fuel_label(&self) -> &str {
        self.fuel_type.as_deref().unwrap_or(UNKNOWN_FUEL)
    }

    /// Expands the embedded brand relation into one row per brand entry.
    ///
    /// A vehicle without brand entries yields no rows, matching `$unwind`
    /// without `preserveNullAndEmptyArrays`.
    pub fn rows(&self) -> impl Iterator<Item = VehicleRow> + '_ {
        self.brand.iter().map(move |entry| VehicleRow {
            brand_name: entry.name.clone(),
            year: self.year,
            price: self.price,
            fuel_type: self.fuel_label().to_string(),
            horsepower: self.specifications.horsepower,
            torque: self.specifications.torque,
            engine_displacement: self.specifications.engine_displacement,
            mileage: self.specifications.mileage,
            model: self.model.clone(),
            color: self.color.clone(),
            transmission: self.transmission.clone(),
        })
    }
}

/// One flattened (vehicle, brand entry) row.
///
/// This is also the row shape of the detailed vehicle table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRow {
    pub brand_name: String,
    pub year: i32,
    pub price: f64,
    /// Fuel category, already mapped to [`UNKNOWN_FUEL`] when absent.
    pub fuel_type: String,
    pub horsepower: Option<f64>,
    pub torque: Option<f64>,
    pub engine_displacement: Option<f64>,
    pub mileage: Option<f64>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub transmission: Option<String>,
}
