//! Dashboard view model: filter resolution, metric cards and chart panels.
//!
//! Panels are delivered as data; a front end only has to draw them. A
//! panel whose query came back empty carries [`NO_DATA`] instead of data,
//! so one failed query never blanks the whole page.

use carlens_core::aggregate::{box_summaries, correlation_matrix};
use carlens_core::format::{format_currency, format_horsepower, format_number, format_optional};
use carlens_core::{
    BoxSummary, CorrelationMatrix, FilterError, FilterOptions, PriceRow, VehicleFilter, YearRange,
};
use serde::Serialize;

use super::query::QueryService;

/// Notice shown on a panel whose query produced nothing.
pub const NO_DATA: &str = "No data available for the selected filters.";

/// Prompt returned instead of panels when no brand is selected.
pub const SELECT_BRAND_PROMPT: &str = "Please select at least one brand.";

/// Raw filter input as received from the user.
///
/// `None` means "not specified" and falls back to the default: the full
/// year range and the first five brands. `Some(vec![])` is an explicit
/// empty selection and is rejected.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub brands: Option<Vec<String>>,
}

/// Applies defaults from `options` and validates the brand selection.
///
/// # Errors
///
/// Returns [`FilterError::NoBrandsSelected`] for an explicit empty selection.
pub fn resolve_filter(
    options: &FilterOptions,
    request: &DashboardRequest,
) -> Result<VehicleFilter, FilterError> {
    let years = YearRange::new(
        request.year_min.unwrap_or(options.min_year),
        request.year_max.unwrap_or(options.max_year),
    );
    match &request.brands {
        Some(brands) => VehicleFilter::new(years, brands.iter().cloned()),
        None => VehicleFilter::new(years, options.default_brands()),
    }
}

/// A chart or table with either data or a notice.
#[derive(Debug, Clone, Serialize)]
pub struct Panel<T> {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

impl<T> Panel<T> {
    fn new(title: &'static str, data: T, empty: bool) -> Self {
        if empty {
            Self {
                title,
                data: None,
                notice: Some(NO_DATA),
            }
        } else {
            Self {
                title,
                data: Some(data),
                notice: None,
            }
        }
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterPanel {
    pub min_year: i32,
    pub max_year: i32,
    pub available_brands: Vec<String>,
    pub selected_years: YearRange,
    pub selected_brands: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceByBrand {
    pub summaries: Vec<BoxSummary>,
    pub points: Vec<PriceRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FuelSlice {
    pub fuel: String,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FuelBar {
    pub fuel: String,
    pub avg_price: f64,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterPoint {
    pub brand_name: String,
    pub horsepower: f64,
    pub price: f64,
}

/// One formatted line of the detailed table.
#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    pub brand: String,
    pub year: i32,
    pub price: String,
    pub fuel: String,
    pub horsepower: String,
    pub torque: String,
    pub engine_displacement: String,
    pub mileage: String,
    pub model: String,
    pub color: String,
    pub transmission: String,
}

/// Everything the single-page dashboard renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filters: FilterPanel,
    pub metrics: Vec<MetricCard>,
    pub price_by_brand: Panel<PriceByBrand>,
    pub fuel_share: Panel<Vec<FuelSlice>>,
    pub fuel_avg_price: Panel<Vec<FuelBar>>,
    pub correlation: Panel<CorrelationMatrix>,
    pub horsepower_vs_price: Panel<Vec<ScatterPoint>>,
    pub table: Panel<Vec<TableRow>>,
}

/// Resolves the filter and runs every query, one after another.
///
/// # Errors
///
/// Returns [`FilterError::NoBrandsSelected`] before any query runs when the
/// selection is explicitly empty.
#[allow(clippy::cast_precision_loss)]
pub async fn build_dashboard(
    service: &QueryService,
    request: &DashboardRequest,
) -> Result<DashboardView, FilterError> {
    let options = service.filter_options().await;
    let filter = resolve_filter(&options, request)?;

    let overview = service.overview(&filter).await;
    let prices = service.price_distribution(&filter).await;
    let fuel = service.fuel_distribution(&filter).await;
    let correlation_rows = service.correlation_rows(&filter).await;
    let vehicles = service.vehicle_rows(&filter).await;

    let metrics = vec![
        MetricCard {
            label: "Total cars",
            value: overview.total_cars as f64,
            display: format_number(overview.total_cars as f64, 0),
        },
        MetricCard {
            label: "Average price",
            value: overview.avg_price,
            display: format_currency(overview.avg_price),
        },
        MetricCard {
            label: "Average horsepower",
            value: overview.avg_horsepower,
            display: format_horsepower(overview.avg_horsepower),
        },
        MetricCard {
            label: "Brands",
            value: overview.brand_count as f64,
            display: overview.brand_count.to_string(),
        },
    ];

    let price_by_brand = PriceByBrand {
        summaries: box_summaries(&prices),
        points: prices.as_ref().clone(),
    };

    let shares = fuel.shares();
    let fuel_share: Vec<FuelSlice> = fuel
        .fuel_counts
        .iter()
        .map(|(fuel_type, count)| FuelSlice {
            fuel: fuel_type.clone(),
            count: *count,
            percent: shares.get(fuel_type).copied().unwrap_or(0.0),
        })
        .collect();
    let fuel_avg_price: Vec<FuelBar> = fuel
        .avg_prices
        .iter()
        .map(|(fuel_type, avg)| FuelBar {
            fuel: fuel_type.clone(),
            avg_price: *avg,
            display: format_currency(*avg),
        })
        .collect();

    let matrix = correlation_matrix(&correlation_rows);
    let matrix_empty = matrix.is_empty();

    let scatter: Vec<ScatterPoint> = vehicles
        .iter()
        .filter_map(|row| {
            Some(ScatterPoint {
                brand_name: row.brand_name.clone(),
                horsepower: row.horsepower?,
                price: row.price,
            })
        })
        .collect();
    let scatter_empty = scatter.is_empty();

    let table: Vec<TableRow> = vehicles
        .iter()
        .map(|row| TableRow {
            brand: row.brand_name.clone(),
            year: row.year,
            price: format_currency(row.price),
            fuel: row.fuel_type.clone(),
            horsepower: format_optional(row.horsepower, 0),
            torque: format_optional(row.torque, 0),
            engine_displacement: format_optional(row.engine_displacement, 2),
            mileage: format_optional(row.mileage, 0),
            model: row.model.clone().unwrap_or_default(),
            color: row.color.clone().unwrap_or_default(),
            transmission: row.transmission.clone().unwrap_or_default(),
        })
        .collect();

    Ok(DashboardView {
        filters: FilterPanel {
            min_year: options.min_year,
            max_year: options.max_year,
            available_brands: options.brands.clone(),
            selected_years: filter.years,
            selected_brands: filter.brand_list(),
        },
        metrics,
        price_by_brand: Panel::new(
            "Price distribution by brand",
            price_by_brand,
            prices.is_empty(),
        ),
        fuel_share: Panel::new("Fuel type share", fuel_share, fuel.is_empty()),
        fuel_avg_price: Panel::new(
            "Average price by fuel type",
            fuel_avg_price,
            fuel.is_empty(),
        ),
        correlation: Panel::new("Specification correlation", matrix, matrix_empty),
        horsepower_vs_price: Panel::new("Horsepower vs. price", scatter, scatter_empty),
        table: Panel::new("Vehicle details", table, vehicles.is_empty()),
    })
}
