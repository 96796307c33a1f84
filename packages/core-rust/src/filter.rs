//! Query parameters shared by every aggregation: a year range and a brand set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::VehicleRow;

/// Inclusive year range. A range with `min > max` is valid and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }

    /// True when no year can satisfy the range.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.min > self.max
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// Rejected filter input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("select at least one brand")]
    NoBrandsSelected,
}

/// The `(year range, brand set)` tuple every aggregation query takes.
///
/// Brands are held in a `BTreeSet`, so two filters built from the same
/// names in a different order are equal and hash identically. This makes
/// the filter directly usable as a memoization key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleFilter {
    pub years: YearRange,
    pub brands: BTreeSet<String>,
}

impl VehicleFilter {
    /// Builds a filter, rejecting an empty brand selection.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::NoBrandsSelected`] when `brands` is empty.
    pub fn new<I, S>(years: YearRange, brands: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let brands: BTreeSet<String> = brands.into_iter().map(Into::into).collect();
        if brands.is_empty() {
            return Err(FilterError::NoBrandsSelected);
        }
        Ok(Self { years, brands })
    }

    /// A flattened row matches when its year is in range and its brand
    /// entry is one of the selected brands.
    #[must_use]
    pub fn matches(&self, row: &VehicleRow) -> bool {
        self.years.contains(row.year) && self.brands.contains(&row.brand_name)
    }

    /// Selected brands in sorted order.
    #[must_use]
    pub fn brand_list(&self) -> Vec<String> {
        self.brands.iter().cloned().collect()
    }
}

impl fmt::Display for VehicleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "years={} brands=[", self.years)?;
        for (i, brand) in self.brands.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(brand)?;
        }
        f.write_str("]")
    }
}
