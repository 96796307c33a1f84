//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use carlens_core::FilterError;
use serde::Serialize;

/// Errors a dashboard request can surface to the client.
///
/// Store failures never reach this layer; they degrade to empty panels
/// inside the query service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Please select at least one brand.")]
    NoBrandsSelected,

    #[error("invalid query parameter: {0}")]
    InvalidParameter(String),

    #[error("server is shutting down")]
    ShuttingDown,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoBrandsSelected => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable code for the `error` field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoBrandsSelected => "no_brands_selected",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::ShuttingDown => "shutting_down",
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::NoBrandsSelected => Self::NoBrandsSelected,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::dashboard::SELECT_BRAND_PROMPT;

    #[test]
    fn empty_selection_maps_to_prompt() {
        let err = ApiError::from(FilterError::NoBrandsSelected);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), SELECT_BRAND_PROMPT);
    }

    #[test]
    fn draining_is_unavailable() {
        let err = ApiError::ShuttingDown;
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "shutting_down");
    }

    #[tokio::test]
    async fn response_body_is_json() {
        let response = ApiError::InvalidParameter("year_min".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid_parameter");
        assert_eq!(body["message"], "invalid query parameter: year_min");
    }
}
