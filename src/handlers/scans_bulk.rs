// handlers/scans_bulk.rs - POST /scans-bulk handler

use axum::{body::Bytes, extract::State, response::Json};
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::RequireApiKey;
use crate::services::{IngestError, IngestReceipt, IngestService};

/**
 * POST /scans-bulk - Store a batch of scans atomically
 *
 * Accepts one scan object or an array of them:
 * ```json
 * [{
 *   "device_id": "string",   // Required
 *   "sample": "string",      // Required
 *   "well_name": "string",   // Required
 *   "block": "string",       // Required
 *   "type": "string",        // Required
 *   "scanned_at": "string",  // Required: ISO 8601 or epoch millis
 *   "local_id": 17,          // Optional: client-side id, echoed into the row
 *   "scanned_by": "string",  // Optional: defaults to "Unknown"
 *   "is_test": false         // Optional: only literal true marks a test scan
 * }]
 * ```
 *
 * Returns `{ "server_ids": [...], "total_on_server": N }` with ids in
 * submission order. Any invalid record fails the whole batch.
 */
pub async fn scans_bulk(
    State(state): State<AppState>,
    _key: RequireApiKey,
    body: Bytes,
) -> Result<Json<IngestReceipt>, ApiError> {
    let expose = state.expose_error_details;

    let payload = parse_body(&body).map_err(|e| ApiError::from_ingest(e, expose))?;

    IngestService::new(state.store.clone())
        .ingest(payload)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_ingest(e, expose))
}

/// An empty body is an empty batch rather than a JSON error
fn parse_body(body: &[u8]) -> Result<Value, IngestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| IngestError::MalformedPayload(e.to_string()))
}
