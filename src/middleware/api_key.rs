use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::auth::API_KEY_HEADER;
use crate::error::ApiError;

/// Extractor proving the request carried a valid `X-API-Key`.
///
/// Runs only once the route and method matched, so a wrong method still
/// answers 405 before the key is looked at.
#[derive(Debug, Clone, Copy)]
pub struct RequireApiKey;

#[async_trait]
impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        if state.guard.validate(key) {
            return Ok(RequireApiKey);
        }

        tracing::warn!(
            "Rejected {} {}: {} API key",
            parts.method,
            parts.uri.path(),
            if key.is_some() { "invalid" } else { "missing" }
        );
        Err(ApiError::unauthorized("Unauthorized"))
    }
}
