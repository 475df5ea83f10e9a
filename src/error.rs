//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Authentication Errors**: Missing, malformed, or rejected bearer tokens
/// - **Resource Errors**: No car owned by the caller matches the request
/// - **Validation Errors**: Invalid request data
/// - **Store Errors**: Database failures and failed conditional writes
/// - **Attachment Errors**: Upload URL could not be issued
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bearer token is missing, malformed, expired, or has a bad signature.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid or missing bearer token")]
    Unauthorized,

    /// No car with the given id belongs to the authenticated user.
    ///
    /// Returned both for unknown ids and for ids owned by someone else, so
    /// callers cannot discover other users' records.
    #[error("Car not found")]
    CarNotFound,

    /// A keyed delete matched no row.
    #[error("Conditional check failed")]
    ConditionalCheckFailed,

    /// The upload URL could not be produced.
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `Unauthorized` → 401 Unauthorized
/// - `CarNotFound` → 404 Not Found
/// - `InvalidRequest` → 400 Bad Request
/// - `ConditionalCheckFailed`, `Attachment`, `Database` → 500 Internal Server Error (details hidden)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::CarNotFound => (StatusCode::NOT_FOUND, "car_not_found", self.to_string()),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::ConditionalCheckFailed | AppError::Attachment(_) | AppError::Database(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Malformed, mistyped or non-JSON request bodies.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// The only path parameter is a car id; one that is not a UUID cannot name
/// any car, so it is reported like an unknown id.
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Unparseable path parameter");
        AppError::CarNotFound
    }
}
