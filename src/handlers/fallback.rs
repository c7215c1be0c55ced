// handlers/fallback.rs - method fallbacks shared by every API route

use axum::http::StatusCode;

use crate::error::ApiError;

/// Bare 200 for `OPTIONS`; CORS headers come from the global layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed")
}
