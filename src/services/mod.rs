pub mod ingest_service;

pub use ingest_service::{IngestError, IngestReceipt, IngestService};
