use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::database::models::{NewSyncLog, ScanValidationError, ValidScan};
use crate::database::{DatabaseError, ScanStore};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Expected non-empty array of scans")]
    EmptyBatch,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Validation(#[from] ScanValidationError),

    #[error("Scan {index} was rejected by the store: {reason}")]
    Rejected { index: usize, reason: String },

    /// Tables could not be created or checked; nothing was attempted yet
    #[error("Schema bootstrap failed: {0}")]
    Bootstrap(DatabaseError),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Body of a successful `POST /scans-bulk`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReceipt {
    pub server_ids: Vec<i32>,
    pub total_on_server: i64,
}

/// Runs one bulk ingest: validate, insert atomically, audit, count.
pub struct IngestService {
    store: Arc<dyn ScanStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn ScanStore>) -> Self {
        Self { store }
    }

    pub async fn ingest(&self, payload: Value) -> Result<IngestReceipt, IngestError> {
        let records = Self::split_payload(payload)?;

        // Validation is pure and runs before the store is touched
        let validated: Result<Vec<ValidScan>, ScanValidationError> = records
            .iter()
            .enumerate()
            .map(|(index, record)| ValidScan::from_json(index, record))
            .collect();

        self.store.ensure_schema().await.map_err(IngestError::Bootstrap)?;

        let scans = match validated {
            Ok(scans) => scans,
            Err(err) => {
                warn!("Rejecting batch of {} scans: {}", records.len(), err);
                self.record_failure(&err.to_string()).await;
                return Err(err.into());
            }
        };

        let success_log = NewSyncLog::success(&scans[0].device_id, scans.len());

        let outcome = match self.store.insert_batch(&scans, &success_log).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.record_failure(&err.to_string()).await;
                return Err(err.into());
            }
        };

        if !outcome.is_committable() {
            let (index, reason) = outcome
                .first_failure()
                .map(|(index, reason)| (index, reason.to_string()))
                .unwrap_or_else(|| (0, "batch incomplete".to_string()));
            let err = IngestError::Rejected { index, reason };
            self.record_failure(&err.to_string()).await;
            return Err(err);
        }

        // Committed and logged; a failed count must not add a second sync log
        let total_on_server = self.store.count_production_samples().await?;

        info!(
            "Ingested {} scans from device {} (total on server: {})",
            scans.len(),
            success_log.device_id,
            total_on_server
        );

        Ok(IngestReceipt {
            server_ids: outcome.server_ids(),
            total_on_server,
        })
    }

    /// A single object is a batch of one.
    fn split_payload(payload: Value) -> Result<Vec<Value>, IngestError> {
        match payload {
            Value::Array(records) if records.is_empty() => Err(IngestError::EmptyBatch),
            Value::Array(records) => Ok(records),
            Value::Object(record) => Ok(vec![Value::Object(record)]),
            Value::Null => Err(IngestError::EmptyBatch),
            _ => Err(IngestError::MalformedPayload(
                "expected a scan object or an array of scans".to_string(),
            )),
        }
    }

    /// Best-effort error log; its own failure is only reported to tracing.
    async fn record_failure(&self, message: &str) {
        if let Err(e) = self.store.log_sync(&NewSyncLog::failure(message)).await {
            error!("Failed to log sync error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::SyncStatus;
    use crate::testing::MemoryStore;
    use serde_json::json;

    fn scan(device: &str, sample: &str) -> Value {
        json!({
            "device_id": device,
            "sample": sample,
            "well_name": "W1",
            "block": "B1",
            "type": "T1",
            "scanned_at": "2024-01-01T00:00:00Z"
        })
    }

    fn service(store: &Arc<MemoryStore>) -> IngestService {
        IngestService::new(store.clone())
    }

    #[tokio::test]
    async fn commits_batch_and_logs_once() {
        let store = Arc::new(MemoryStore::default());
        let receipt = service(&store)
            .ingest(json!([scan("D1", "S1"), scan("D2", "S2"), scan("D1", "S3")]))
            .await
            .unwrap();

        assert_eq!(receipt.server_ids, vec![1, 2, 3]);
        assert_eq!(receipt.total_on_server, 3);

        let state = store.snapshot().await;
        assert_eq!(state.samples.len(), 3);
        assert_eq!(state.sync_logs.len(), 1);
        assert_eq!(state.sync_logs[0].status, SyncStatus::Success);
        assert_eq!(state.sync_logs[0].scans_count, 3);
        // Multi-device batches are attributed to the first record's device
        assert_eq!(state.sync_logs[0].device_id, "D1");
    }

    #[tokio::test]
    async fn validation_failure_writes_nothing_but_the_error_log() {
        let store = Arc::new(MemoryStore::default());
        let err = service(&store)
            .ingest(json!([scan("D1", "S1"), { "device_id": "D1" }]))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Validation(ScanValidationError::MissingField { index: 1, field: "sample" })));

        let state = store.snapshot().await;
        assert!(state.samples.is_empty());
        assert_eq!(state.sync_logs.len(), 1);
        assert_eq!(state.sync_logs[0].status, SyncStatus::Error);
        assert!(state.sync_logs[0].error_message.as_deref().unwrap().contains("sample"));
    }

    #[tokio::test]
    async fn store_rejection_rolls_back_whole_batch() {
        let store = Arc::new(MemoryStore::rejecting_sample("BAD"));
        let err = service(&store)
            .ingest(json!([scan("D1", "S1"), scan("D1", "BAD"), scan("D1", "S3")]))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Rejected { index: 1, .. }));

        let state = store.snapshot().await;
        assert!(state.samples.is_empty());
        assert_eq!(state.sync_logs.len(), 1);
        assert_eq!(state.sync_logs[0].status, SyncStatus::Error);
    }

    #[tokio::test]
    async fn schema_failure_is_a_bootstrap_error() {
        let store = Arc::new(MemoryStore::unreachable());
        let err = service(&store).ingest(json!([scan("D1", "S1")])).await.unwrap_err();
        assert!(matches!(err, IngestError::Bootstrap(_)));
        assert!(store.snapshot().await.sync_logs.is_empty());
    }

    #[tokio::test]
    async fn failed_commit_logs_one_error_and_keeps_nothing() {
        let store = Arc::new(MemoryStore::failing_commit());
        let err = service(&store)
            .ingest(json!([scan("D1", "S1"), scan("D1", "S2")]))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Store(_)));

        let state = store.snapshot().await;
        assert_eq!(state.schema_checks, 1);
        assert!(state.samples.is_empty());
        assert_eq!(state.sync_logs.len(), 1);
        assert_eq!(state.sync_logs[0].status, SyncStatus::Error);
        assert_eq!(state.sync_logs[0].scans_count, 0);
    }

    #[tokio::test]
    async fn empty_and_malformed_payloads_never_touch_the_store() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);

        assert!(matches!(svc.ingest(json!([])).await, Err(IngestError::EmptyBatch)));
        assert!(matches!(svc.ingest(Value::Null).await, Err(IngestError::EmptyBatch)));
        assert!(matches!(svc.ingest(json!("S1")).await, Err(IngestError::MalformedPayload(_))));

        let state = store.snapshot().await;
        assert_eq!(state.schema_checks, 0);
        assert!(state.sync_logs.is_empty());
    }

    #[tokio::test]
    async fn resubmission_duplicates_rows() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let batch = json!([scan("D1", "S1"), scan("D1", "S2")]);

        svc.ingest(batch.clone()).await.unwrap();
        let second = svc.ingest(batch).await.unwrap();

        assert_eq!(second.server_ids, vec![3, 4]);
        assert_eq!(second.total_on_server, 4);
    }
}
