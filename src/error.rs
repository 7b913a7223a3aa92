//! Error handling module
//!
//! Provides unified error types and handling for the entire application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Status code and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Pool(_) => (StatusCode::SERVICE_UNAVAILABLE, "POOL_EXHAUSTED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let (message, details) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                ("A database error occurred".to_string(), Some(e.to_string()))
            }
            AppError::Pool(e) => {
                error!("Pool error: {:?}", e);
                ("Database connection pool exhausted".to_string(), Some(e.to_string()))
            }
            AppError::Upstream(msg) => {
                warn!("Upstream error: {}", msg);
                ("Geolocation service unavailable".to_string(), Some(msg.clone()))
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), Some(msg.clone()))
            }
            AppError::Config(msg) => {
                error!("Configuration error: {}", msg);
                ("A configuration error occurred".to_string(), Some(msg.clone()))
            }
            AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg) => (msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(error_code.to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create an upstream error
pub fn upstream_error(msg: impl Into<String>) -> AppError {
    AppError::Upstream(msg.into())
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = validation_error("address data incomplete");
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"));
        assert_eq!(err.to_string(), "Validation error: address data incomplete");
    }

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let err = upstream_error("geolocation retrieval failed");
        assert_eq!(err.status_and_code(), (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"));
    }

    #[test]
    fn test_into_response_status() {
        let response = not_found_error("Address 7 not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
