use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use pricedesk_core::FetchError;
use pricedesk_store::StoreError;

/// Unified error type for API responses.
///
/// Unknown assets map to 404; every fetch-layer failure (including a local
/// rate-limit denial, whose message carries the retry hint) maps to 500
/// with an `{error, details}` payload.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Fetch(FetchError),
    Store(StoreError),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "not_found: {msg}"),
            Self::Fetch(error) => write!(f, "fetch_error: {error}"),
            Self::Store(error) => write!(f, "store_error: {error}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(msg) => {
                let body = json!({ "error": msg });
                (StatusCode::NOT_FOUND, axum::Json(body)).into_response()
            }
            Self::Fetch(error) => {
                let body = json!({
                    "error": "Failed to fetch price",
                    "details": error.to_string(),
                    "code": error.code(),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
            }
            Self::Store(error) => {
                let body = json!({
                    "error": "Storage operation failed",
                    "details": error.to_string(),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
            }
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(error: FetchError) -> Self {
        Self::Fetch(error)
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}
