// handlers/scans_count.rs - GET /scans-count handler

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::RequireApiKey;

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub total_on_server: i64,
}

/// Number of non-test samples stored on the server
pub async fn scans_count(
    State(state): State<AppState>,
    _key: RequireApiKey,
) -> Result<Json<CountResponse>, ApiError> {
    let expose = state.expose_error_details;

    state
        .store
        .ensure_schema()
        .await
        .map_err(|e| ApiError::from_database(e, expose))?;

    let total_on_server = state
        .store
        .count_production_samples()
        .await
        .map_err(|e| ApiError::from_database(e, expose))?;

    Ok(Json(CountResponse { total_on_server }))
}
