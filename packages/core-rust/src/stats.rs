//! Result shapes returned by the aggregation queries.
//!
//! Every type has a `Default` that is the empty/zero value used when a
//! query fails or matches nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Headline numbers for the metric cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    /// Number of matched flattened rows.
    pub total_cars: u64,
    /// Mean price over matched rows, 0 when nothing matched.
    pub avg_price: f64,
    /// Mean horsepower over matched rows that report it, 0 when none do.
    pub avg_horsepower: f64,
    /// Distinct brand names among the matched rows.
    pub brand_count: u64,
}

impl OverviewStats {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_cars == 0
    }
}

/// One point of the price-by-brand distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub brand_name: String,
    pub price: f64,
}

/// Vehicle count and mean price per fuel category.
///
/// Keys are fuel labels with missing values already mapped to `"Unknown"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuelDistribution {
    pub fuel_counts: BTreeMap<String, u64>,
    pub avg_prices: BTreeMap<String, f64>,
}

impl FuelDistribution {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fuel_counts.is_empty()
    }

    /// Sum of all per-fuel counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.fuel_counts.values().sum()
    }

    /// Percentage share of each fuel category, for the pie chart.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn shares(&self) -> BTreeMap<String, f64> {
        let total = self.total();
        if total == 0 {
            return BTreeMap::new();
        }
        self.fuel_counts
            .iter()
            .map(|(fuel, count)| (fuel.clone(), *count as f64 * 100.0 / total as f64))
            .collect()
    }
}

/// Numeric columns fed into the correlation heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRow {
    pub price: f64,
    pub horsepower: Option<f64>,
    pub torque: Option<f64>,
    pub engine_displacement: Option<f64>,
}

impl CorrelationRow {
    /// Column values in [`CORRELATION_COLUMNS`] order.
    #[must_use]
    pub fn values(&self) -> [Option<f64>; 4] {
        [
            Some(self.price),
            self.horsepower,
            self.torque,
            self.engine_displacement,
        ]
    }
}

/// Column names of the correlation matrix, in row/column order.
pub const CORRELATION_COLUMNS: [&str; 4] = ["price", "horsepower", "torque", "engineDisplacement"];

/// Pairwise Pearson coefficients. `None` marks a cell without enough data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// True when no cell carries a coefficient.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.iter().flatten().all(Option::is_none)
    }
}

/// Five-number summary of one brand's prices, for the box plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub brand_name: String,
    pub count: u64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Bounds and choices for the year slider and brand multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub min_year: i32,
    pub max_year: i32,
    /// Sorted distinct brand names.
    pub brands: Vec<String>,
}

impl FilterOptions {
    pub const FALLBACK_MIN_YEAR: i32 = 2000;
    pub const FALLBACK_MAX_YEAR: i32 = 2023;
    pub const PLACEHOLDER_BRAND: &'static str = "N/A";
    /// Number of brands pre-selected in the multi-select.
    pub const DEFAULT_SELECTION: usize = 5;

    /// Options used when the store cannot be read or holds no vehicles.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            min_year: Self::FALLBACK_MIN_YEAR,
            max_year: Self::FALLBACK_MAX_YEAR,
            brands: vec![Self::PLACEHOLDER_BRAND.to_string()],
        }
    }

    /// The first five brands (fewer if fewer exist).
    #[must_use]
    pub fn default_brands(&self) -> Vec<String> {
        self.brands
            .iter()
            .take(Self::DEFAULT_SELECTION)
            .cloned()
            .collect()
    }
}
