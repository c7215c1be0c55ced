// handlers/health.rs - GET /health handler

use axum::response::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

/// Static liveness payload. Does not touch the database.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Sampling API is running",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
