//! Application error types with HTTP status code mapping.
//!
//! [`AppError`] is the central error type for the server. Each variant
//! maps to a specific HTTP status code and a flat JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ItemId;

/// JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// { "error": "Item 42 not found" }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// | Variant          | HTTP Status                |
/// |------------------|----------------------------|
/// | `InvalidRequest` | 400 Bad Request            |
/// | `ItemNotFound`   | 404 Not Found              |
/// | `RouteNotFound`  | 404 Not Found              |
/// | `Database`       | 500 Internal Server Error  |
/// | `Internal`       | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Item with the given ID does not exist.
    #[error("Item {0} not found")]
    ItemNotFound(ItemId),

    /// Request validation failed. The message is returned verbatim.
    #[error("{0}")]
    InvalidRequest(String),

    /// Path segment did not identify a resource (e.g. non-integer item ID).
    #[error("Not found")]
    RouteNotFound,

    /// Database failure, carrying the driver's error text.
    #[error("{0}")]
    Database(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ItemNotFound(_) | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}
