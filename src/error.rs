// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseError;
use crate::services::IngestError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::MethodNotAllowed(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Short title clients key off of
    pub fn title(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidJson(_) => "Bad request",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::MethodNotAllowed(_) => "Method not allowed",
            ApiError::InternalServerError(_) => "Internal server error",
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.title(),
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        ApiError::MethodNotAllowed(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    /// 500 that carries `detail` only when the deployment allows it.
    pub fn internal_with_detail(detail: impl Into<String>, generic: &str, expose: bool) -> Self {
        if expose {
            ApiError::InternalServerError(detail.into())
        } else {
            ApiError::InternalServerError(generic.to_string())
        }
    }

    /// Map an ingest failure onto the wire, hiding store and validation
    /// details unless `expose` is set.
    pub fn from_ingest(err: IngestError, expose: bool) -> Self {
        match err {
            IngestError::EmptyBatch => ApiError::bad_request("Expected non-empty array of scans"),
            IngestError::MalformedPayload(msg) => ApiError::invalid_json(msg),
            // Nothing was saved or rolled back yet, so this is a plain server error
            IngestError::Bootstrap(err) => ApiError::from_database(err, expose),
            other => {
                tracing::error!("Scan ingest failed: {}", other);
                ApiError::internal_with_detail(other.to_string(), "Failed to save scans", expose)
            }
        }
    }

    pub fn from_database(err: DatabaseError, expose: bool) -> Self {
        tracing::error!("Database error: {}", err);
        ApiError::internal_with_detail(err.to_string(), "Server error", expose)
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
