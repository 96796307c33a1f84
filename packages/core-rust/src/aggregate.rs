//! In-memory evaluation of the dashboard aggregations.
//!
//! These functions define the reference semantics of every query: flatten
//! the brand relation, keep the rows the filter matches, then group or
//! project. The in-memory store evaluates queries with them directly, and
//! the view layer uses the derived computations (correlation matrix,
//! box-plot summaries) on results coming from any store.

use std::collections::{BTreeMap, BTreeSet};

use crate::filter::VehicleFilter;
use crate::stats::{
    BoxSummary, CorrelationMatrix, CorrelationRow, FilterOptions, FuelDistribution, OverviewStats,
    PriceRow, CORRELATION_COLUMNS,
};
use crate::types::{Vehicle, VehicleRow};

/// Running arithmetic mean that skips missing values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// `None` when no value was pushed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Flattens every vehicle and keeps the rows matching `filter`.
pub fn matching_rows<'a, I>(vehicles: I, filter: &VehicleFilter) -> Vec<VehicleRow>
where
    I: IntoIterator<Item = &'a Vehicle>,
{
    vehicles
        .into_iter()
        .filter(|v| filter.years.contains(v.year))
        .flat_map(Vehicle::rows)
        .filter(|row| filter.matches(row))
        .collect()
}

#[must_use]
pub fn overview(rows: &[VehicleRow]) -> OverviewStats {
    let mut price = Mean::default();
    let mut horsepower = Mean::default();
    let mut brands = BTreeSet::new();

    for row in rows {
        price.push(Some(row.price));
        horsepower.push(row.horsepower);
        brands.insert(row.brand_name.as_str());
    }

    OverviewStats {
        total_cars: rows.len() as u64,
        avg_price: price.value().unwrap_or(0.0),
        avg_horsepower: horsepower.value().unwrap_or(0.0),
        brand_count: brands.len() as u64,
    }
}

#[must_use]
pub fn price_distribution(rows: &[VehicleRow]) -> Vec<PriceRow> {
    rows.iter()
        .map(|row| PriceRow {
            brand_name: row.brand_name.clone(),
            price: row.price,
        })
        .collect()
}

#[must_use]
pub fn fuel_distribution(rows: &[VehicleRow]) -> FuelDistribution {
    let mut groups: BTreeMap<&str, (u64, Mean)> = BTreeMap::new();
    for row in rows {
        let (count, mean) = groups.entry(row.fuel_type.as_str()).or_default();
        *count += 1;
        mean.push(Some(row.price));
    }

    let mut dist = FuelDistribution::default();
    for (fuel, (count, mean)) in groups {
        dist.fuel_counts.insert(fuel.to_string(), count);
        dist.avg_prices.insert(fuel.to_string(), mean.value().unwrap_or(0.0));
    }
    dist
}

#[must_use]
pub fn correlation_rows(rows: &[VehicleRow]) -> Vec<CorrelationRow> {
    rows.iter()
        .map(|row| CorrelationRow {
            price: row.price,
            horsepower: row.horsepower,
            torque: row.torque,
            engine_displacement: row.engine_displacement,
        })
        .collect()
}

/// Year bounds and sorted brand names over all flattened rows.
///
/// Returns `None` when there is no row at all (empty collection, or no
/// vehicle carries a brand entry).
pub fn filter_options<'a, I>(vehicles: I) -> Option<FilterOptions>
where
    I: IntoIterator<Item = &'a Vehicle>,
{
    let mut years: Option<(i32, i32)> = None;
    let mut brands = BTreeSet::new();

    for vehicle in vehicles {
        if vehicle.brand.is_empty() {
            continue;
        }
        years = Some(match years {
            None => (vehicle.year, vehicle.year),
            Some((lo, hi)) => (lo.min(vehicle.year), hi.max(vehicle.year)),
        });
        brands.extend(vehicle.brand.iter().map(|b| b.name.clone()));
    }

    years.map(|(min_year, max_year)| FilterOptions {
        min_year,
        max_year,
        brands: brands.into_iter().collect(),
    })
}

/// Pearson coefficient over the pairs where both values are present.
///
/// `None` with fewer than two complete pairs or when either side has
/// zero variance.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Pairwise-complete Pearson matrix over [`CORRELATION_COLUMNS`].
#[must_use]
pub fn correlation_matrix(rows: &[CorrelationRow]) -> CorrelationMatrix {
    let table: Vec<[Option<f64>; 4]> = rows.iter().map(CorrelationRow::values).collect();
    let width = CORRELATION_COLUMNS.len();

    let mut values = vec![vec![None; width]; width];
    for i in 0..width {
        for j in i..width {
            let pairs: Vec<(f64, f64)> = table
                .iter()
                .filter_map(|r| Some((r[i]?, r[j]?)))
                .collect();
            let r = pearson(&pairs);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: CORRELATION_COLUMNS.iter().map(ToString::to_string).collect(),
        values,
    }
}

/// Linear-interpolated quantile of an ascending slice. `q` is in `[0, 1]`.
///
/// # Panics
///
/// Panics if `sorted` is empty.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    assert!(!sorted.is_empty(), "quantile of an empty slice");
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Per-brand five-number summaries, ordered by brand name.
#[must_use]
pub fn box_summaries(rows: &[PriceRow]) -> Vec<BoxSummary> {
    let mut by_brand: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_brand
            .entry(row.brand_name.as_str())
            .or_default()
            .push(row.price);
    }

    by_brand
        .into_iter()
        .map(|(brand, mut prices)| {
            prices.sort_by(f64::total_cmp);
            BoxSummary {
                brand_name: brand.to_string(),
                count: prices.len() as u64,
                min: prices[0],
                q1: quantile(&prices, 0.25),
                median: quantile(&prices, 0.5),
                q3: quantile(&prices, 0.75),
                max: prices[prices.len() - 1],
            }
        })
        .collect()
}
