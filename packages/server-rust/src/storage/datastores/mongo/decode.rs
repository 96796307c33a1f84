//! Conversion of aggregation result documents into `carlens_core` types.

use carlens_core::{
    CorrelationRow, FilterOptions, FuelDistribution, OverviewStats, PriceRow, VehicleRow,
};
use mongodb::bson::{Bson, Document};

use crate::storage::error::StoreError;

/// Reads a numeric field regardless of its BSON encoding.
///
/// Missing, null and non-numeric values are `None`.
#[allow(clippy::cast_precision_loss)]
fn number(doc: &Document, key: &str) -> Option<f64> {
    match doc.get(key)? {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer(doc: &Document, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

fn year(doc: &Document, query: &'static str, field: &'static str) -> Result<i32, StoreError> {
    integer(doc, field)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or(StoreError::Decode { query, field })
}

fn string(doc: &Document, query: &'static str, field: &'static str) -> Result<String, StoreError> {
    doc.get_str(field)
        .map(ToString::to_string)
        .map_err(|_| StoreError::Decode { query, field })
}

fn optional_string(doc: &Document, key: &str) -> Option<String> {
    doc.get_str(key).ok().map(ToString::to_string)
}

fn required(doc: &Document, query: &'static str, field: &'static str) -> Result<f64, StoreError> {
    number(doc, field).ok_or(StoreError::Decode { query, field })
}

fn count(doc: &Document, query: &'static str, field: &'static str) -> Result<u64, StoreError> {
    integer(doc, field)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or(StoreError::Decode { query, field })
}

/// The single group document, or zeros when nothing matched.
pub fn overview(doc: Option<&Document>) -> Result<OverviewStats, StoreError> {
    let Some(doc) = doc else {
        return Ok(OverviewStats::default());
    };
    Ok(OverviewStats {
        total_cars: count(doc, "overview", "totalCars")?,
        avg_price: number(doc, "avgPrice").unwrap_or(0.0),
        avg_horsepower: number(doc, "avgHorsepower").unwrap_or(0.0),
        brand_count: count(doc, "overview", "brandCount")?,
    })
}

/// `None` when the collection had no flattened rows.
pub fn filter_options(doc: Option<&Document>) -> Result<Option<FilterOptions>, StoreError> {
    const QUERY: &str = "filter options";
    let Some(doc) = doc else {
        return Ok(None);
    };

    let names = doc.get_array("brands").map_err(|_| StoreError::Decode {
        query: QUERY,
        field: "brands",
    })?;
    let mut brands: Vec<String> = names
        .iter()
        .filter_map(|b| b.as_str().map(ToString::to_string))
        .collect();
    brands.sort();
    brands.dedup();

    Ok(Some(FilterOptions {
        min_year: year(doc, QUERY, "minYear")?,
        max_year: year(doc, QUERY, "maxYear")?,
        brands,
    }))
}

pub fn price_row(doc: &Document) -> Result<PriceRow, StoreError> {
    Ok(PriceRow {
        brand_name: string(doc, "price distribution", "brandName")?,
        price: required(doc, "price distribution", "price")?,
    })
}

/// Folds the per-fuel group documents into one distribution.
pub fn fuel_distribution(docs: &[Document]) -> Result<FuelDistribution, StoreError> {
    const QUERY: &str = "fuel distribution";
    let mut dist = FuelDistribution::default();
    for doc in docs {
        let fuel = string(doc, QUERY, "_id")?;
        dist.fuel_counts.insert(fuel.clone(), count(doc, QUERY, "count")?);
        dist.avg_prices.insert(fuel, number(doc, "avgPrice").unwrap_or(0.0));
    }
    Ok(dist)
}

pub fn correlation_row(doc: &Document) -> Result<CorrelationRow, StoreError> {
    Ok(CorrelationRow {
        price: required(doc, "correlation", "price")?,
        horsepower: number(doc, "horsepower"),
        torque: number(doc, "torque"),
        engine_displacement: number(doc, "engineDisplacement"),
    })
}

pub fn vehicle_row(doc: &Document) -> Result<VehicleRow, StoreError> {
    const QUERY: &str = "vehicle table";
    Ok(VehicleRow {
        brand_name: string(doc, QUERY, "brandName")?,
        year: year(doc, QUERY, "year")?,
        price: required(doc, QUERY, "price")?,
        fuel_type: string(doc, QUERY, "fuelType")?,
        horsepower: number(doc, "horsepower"),
        torque: number(doc, "torque"),
        engine_displacement: number(doc, "engineDisplacement"),
        mileage: number(doc, "mileage"),
        model: optional_string(doc, "model"),
        color: optional_string(doc, "color"),
        transmission: optional_string(doc, "transmission"),
    })
}
