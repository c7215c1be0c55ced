// handlers/mod.rs - HTTP handlers
//
// Public:    GET /health
// Protected: POST /scans-bulk, GET /scans-count (X-API-Key required)

pub mod fallback;
pub mod health;
pub mod scans_bulk;
pub mod scans_count;

pub use fallback::{method_not_allowed, preflight};
pub use health::health;
pub use scans_bulk::scans_bulk;
pub use scans_count::scans_count;
