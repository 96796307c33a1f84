//! Dashboard JSON endpoints.
//!
//! Every query endpoint takes the same filter parameters, resolves them
//! against the filter options and returns the query result as-is. Store
//! failures have already been degraded to empty values by the
//! [`QueryService`](crate::service::QueryService), so the only error
//! responses here are bad parameters and the empty-brand guard.

use std::collections::BTreeMap;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use carlens_core::aggregate::{box_summaries, correlation_matrix};
use carlens_core::{
    BoxSummary, CorrelationMatrix, CorrelationRow, FilterOptions, OverviewStats, PriceRow,
    VehicleFilter,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::network::ApiError;
use crate::service::{build_dashboard, resolve_filter, DashboardRequest};

/// Query-string filter shared by every `/api` endpoint.
///
/// `brands` is comma separated. Absent selects the default brands; present
/// but empty (`brands=`) is an explicit empty selection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub brands: Option<String>,
}

impl FilterParams {
    #[must_use]
    pub fn into_request(self) -> DashboardRequest {
        DashboardRequest {
            year_min: self.year_min,
            year_max: self.year_max,
            brands: self.brands.map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .map(String::from)
                    .collect()
            }),
        }
    }
}

type FilterQuery = Result<Query<FilterParams>, QueryRejection>;

fn parse(params: FilterQuery) -> Result<DashboardRequest, ApiError> {
    let Query(params) =
        params.map_err(|rejection| ApiError::InvalidParameter(rejection.body_text()))?;
    Ok(params.into_request())
}

/// Turns the raw query string into a validated filter.
async fn resolve(state: &AppState, params: FilterQuery) -> Result<VehicleFilter, ApiError> {
    let request = parse(params)?;
    let options = state.service.filter_options().await;
    Ok(resolve_filter(&options, &request)?)
}

#[derive(Debug, Serialize)]
struct FiltersBody {
    #[serde(flatten)]
    options: FilterOptions,
    default_brands: Vec<String>,
}

/// `GET /api/filters`
pub async fn filters_handler(State(state): State<AppState>) -> Response {
    let options = state.service.filter_options().await;
    let default_brands = options.default_brands();
    Json(FiltersBody {
        options,
        default_brands,
    })
    .into_response()
}

/// `GET /api/overview`
pub async fn overview_handler(
    State(state): State<AppState>,
    params: FilterQuery,
) -> Result<Json<OverviewStats>, ApiError> {
    let filter = resolve(&state, params).await?;
    Ok(Json(state.service.overview(&filter).await))
}

#[derive(Debug, Serialize)]
struct PricesBody<'a> {
    rows: &'a [PriceRow],
    summaries: Vec<BoxSummary>,
}

/// `GET /api/prices`: one row per matched vehicle-brand pair, plus the
/// per-brand box summaries.
pub async fn prices_handler(
    State(state): State<AppState>,
    params: FilterQuery,
) -> Result<Response, ApiError> {
    let filter = resolve(&state, params).await?;
    let rows = state.service.price_distribution(&filter).await;
    let body = PricesBody {
        rows: rows.as_slice(),
        summaries: box_summaries(&rows),
    };
    Ok(Json(body).into_response())
}

#[derive(Debug, Serialize)]
struct FuelBody {
    fuel_counts: BTreeMap<String, u64>,
    avg_prices: BTreeMap<String, f64>,
    shares: BTreeMap<String, f64>,
}

/// `GET /api/fuel`
pub async fn fuel_handler(
    State(state): State<AppState>,
    params: FilterQuery,
) -> Result<Response, ApiError> {
    let filter = resolve(&state, params).await?;
    let dist = state.service.fuel_distribution(&filter).await;
    let shares = dist.shares();
    let body = FuelBody {
        fuel_counts: dist.fuel_counts,
        avg_prices: dist.avg_prices,
        shares,
    };
    Ok(Json(body).into_response())
}

#[derive(Debug, Serialize)]
struct CorrelationBody<'a> {
    rows: &'a [CorrelationRow],
    matrix: CorrelationMatrix,
}

/// `GET /api/correlation`: raw rows and the pairwise Pearson matrix.
pub async fn correlation_handler(
    State(state): State<AppState>,
    params: FilterQuery,
) -> Result<Response, ApiError> {
    let filter = resolve(&state, params).await?;
    let rows = state.service.correlation_rows(&filter).await;
    let body = CorrelationBody {
        rows: rows.as_slice(),
        matrix: correlation_matrix(&rows),
    };
    Ok(Json(body).into_response())
}

/// `GET /api/vehicles`
pub async fn vehicles_handler(
    State(state): State<AppState>,
    params: FilterQuery,
) -> Result<Response, ApiError> {
    let filter = resolve(&state, params).await?;
    let rows = state.service.vehicle_rows(&filter).await;
    Ok(Json(rows.as_slice()).into_response())
}

/// `GET /api/dashboard`: the complete view model in one response.
pub async fn dashboard_handler(
    State(state): State<AppState>,
    params: FilterQuery,
) -> Result<Response, ApiError> {
    let request = parse(params)?;
    let view = build_dashboard(&state.service, &request).await?;
    Ok(Json(view).into_response())
}

/// `GET /metrics`: Prometheus text format, 404 without a recorder.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::network::{build_router, NetworkConfig};
    use crate::service::query::tests::{scenario_store, FailingStore};
    use crate::service::{QueryService, ServiceConfig};
    use crate::traits::VehicleStore;

    fn app_with(store: Arc<dyn VehicleStore>) -> Router {
        let service = QueryService::new(store, ServiceConfig::default());
        build_router(AppState::new(Arc::new(service), NetworkConfig::default()))
    }

    fn app() -> Router {
        app_with(Arc::new(scenario_store()))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[test]
    fn params_split_brands() {
        let params = FilterParams {
            brands: Some("Toyota, Honda,,".into()),
            ..FilterParams::default()
        };
        assert_eq!(
            params.into_request().brands,
            Some(vec!["Toyota".to_string(), "Honda".to_string()])
        );
    }

    #[test]
    fn absent_brands_stay_unspecified() {
        assert_eq!(FilterParams::default().into_request().brands, None);
    }

    #[tokio::test]
    async fn filters_lists_options_and_defaults() {
        let (status, body) = get(app(), "/api/filters").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["min_year"], 2020);
        assert_eq!(body["max_year"], 2022);
        assert_eq!(body["brands"], serde_json::json!(["Honda", "Lexus", "Toyota"]));
        assert_eq!(body["default_brands"], body["brands"]);
    }

    #[tokio::test]
    async fn filters_fall_back_when_store_fails() {
        let (status, body) = get(app_with(Arc::new(FailingStore::default())), "/api/filters").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["min_year"], 2000);
        assert_eq!(body["max_year"], 2023);
        assert_eq!(body["brands"], serde_json::json!(["N/A"]));
    }

    #[tokio::test]
    async fn overview_for_toyota() {
        let uri = "/api/overview?year_min=2020&year_max=2022&brands=Toyota";
        let (status, body) = get(app(), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_cars"], 2);
        assert_eq!(body["avg_price"], 40_000.0);
    }

    #[tokio::test]
    async fn empty_brand_selection_is_rejected() {
        let (status, body) = get(app(), "/api/overview?brands=").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "no_brands_selected");
        assert_eq!(body["message"], "Please select at least one brand.");
    }

    #[tokio::test]
    async fn malformed_year_is_bad_request() {
        let (status, body) = get(app(), "/api/overview?year_min=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_parameter");
    }

    #[tokio::test]
    async fn fuel_reports_unknown_category() {
        let (status, body) = get(app(), "/api/fuel?year_min=2021&year_max=2021&brands=Honda").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fuel_counts"], serde_json::json!({ "Unknown": 1 }));
        assert_eq!(body["avg_prices"], serde_json::json!({ "Unknown": 25_000.0 }));
        assert_eq!(body["shares"]["Unknown"], 100.0);
    }

    #[tokio::test]
    async fn prices_returns_rows_and_summaries() {
        let (status, body) = get(app(), "/api/prices?brands=Toyota,Lexus").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().unwrap().len(), 3);
        assert_eq!(body["summaries"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn correlation_includes_matrix() {
        let (status, body) = get(app(), "/api/correlation").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().unwrap().len(), 4);
        assert_eq!(body["matrix"]["columns"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn vehicles_are_flattened_rows() {
        let (status, body) = get(app(), "/api/vehicles?brands=Toyota,Lexus,Honda").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn failing_store_degrades_to_empty() {
        let app = app_with(Arc::new(FailingStore::default()));
        let (status, body) = get(app, "/api/overview?brands=Toyota").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_cars"], 0);
    }

    #[tokio::test]
    async fn dashboard_renders_panels() {
        let (status, body) = get(app(), "/api/dashboard?brands=Toyota").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metrics"].as_array().unwrap().len(), 4);
        assert_eq!(body["metrics"][0]["display"], "2");
        assert_eq!(body["filters"]["selected_brands"], serde_json::json!(["Toyota"]));
        assert!(body["table"]["data"].is_array());
    }

    #[tokio::test]
    async fn dashboard_guard_on_empty_selection() {
        let (status, body) = get(app(), "/api/dashboard?brands=").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "no_brands_selected");
    }

    #[tokio::test]
    async fn queries_refused_while_draining() {
        let service = QueryService::new(Arc::new(scenario_store()), ServiceConfig::default());
        let state = AppState::new(Arc::new(service), NetworkConfig::default());
        state.shutdown.set_ready();
        state.shutdown.trigger_shutdown();
        let app = build_router(state);

        let (status, body) = get(app.clone(), "/api/overview").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "shutting_down");
        let (status, _) = get(app, "/health/live").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_missing_without_recorder() {
        let (status, _) = get(app(), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
