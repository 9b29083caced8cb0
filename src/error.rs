// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use std::sync::OnceLock;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// Conflict-style failures (duplicate email, pet already adopted, duplicate
/// pending request) are BadRequest here: the public contract uses 400 for
/// them, not 409.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Whether internal error details are echoed back to the client.
/// Read once from APP_ENV; anything but "production" counts as development.
fn include_details() -> bool {
    static DEV_MODE: OnceLock<bool> = OnceLock::new();
    *DEV_MODE.get_or_init(|| {
        std::env::var("APP_ENV")
            .map(|v| v != "production")
            .unwrap_or(true)
    })
}

/// Implements `IntoResponse` for `AppError`.
/// Every failure is serialized as the `{success:false, error}` envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    include_details().then_some(msg),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
        };

        let mut body = json!({
            "success": false,
            "error": error_message,
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
