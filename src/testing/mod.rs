use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::database::models::{BatchOutcome, InsertOutcome, NewSyncLog, ValidScan};
use crate::database::{DatabaseError, ScanStore};

/// In-process `ScanStore` with the same atomicity as the Postgres store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub samples: Vec<(i32, ValidScan)>,
    pub sync_logs: Vec<NewSyncLog>,
    pub schema_checks: usize,
    next_id: i32,
    reject_sample: Option<String>,
    unreachable: bool,
    fail_commit: bool,
}

impl MemoryStore {
    /// Fails any insert whose `sample` equals `sample`, like a constraint violation
    pub fn rejecting_sample(sample: &str) -> Self {
        Self::with_state(MemoryState {
            reject_sample: Some(sample.to_string()),
            ..MemoryState::default()
        })
    }

    /// Every call fails as if the database were down
    pub fn unreachable() -> Self {
        Self::with_state(MemoryState {
            unreachable: true,
            ..MemoryState::default()
        })
    }

    /// Schema checks and log writes succeed, but every batch transaction
    /// fails after its inserts, like a dropped connection at commit time
    pub fn failing_commit() -> Self {
        Self::with_state(MemoryState {
            fail_commit: true,
            ..MemoryState::default()
        })
    }

    fn with_state(state: MemoryState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    fn check_reachable(state: &MemoryState) -> Result<(), DatabaseError> {
        if state.unreachable {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().await;
        Self::check_reachable(&state)?;
        state.schema_checks += 1;
        Ok(())
    }

    async fn insert_batch(
        &self,
        scans: &[ValidScan],
        success_log: &NewSyncLog,
    ) -> Result<BatchOutcome, DatabaseError> {
        let mut state = self.state.lock().await;
        Self::check_reachable(&state)?;

        let mut outcome = BatchOutcome::new(scans.len());
        let mut pending = Vec::with_capacity(scans.len());
        let mut next_id = state.next_id;

        for (index, scan) in scans.iter().enumerate() {
            if state.reject_sample.as_deref() == Some(scan.sample.as_str()) {
                outcome.push(InsertOutcome::Failed {
                    index,
                    reason: format!("sample '{}' violates a constraint", scan.sample),
                });
                break;
            }
            next_id += 1;
            pending.push((next_id, scan.clone()));
            outcome.push(InsertOutcome::Inserted { index, server_id: next_id });
        }

        if state.fail_commit {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolClosed));
        }

        if outcome.is_committable() {
            // Ids are consumed only on commit
            state.next_id = next_id;
            state.samples.extend(pending);
            state.sync_logs.push(success_log.clone());
        }

        Ok(outcome)
    }

    async fn log_sync(&self, entry: &NewSyncLog) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().await;
        Self::check_reachable(&state)?;
        state.sync_logs.push(entry.clone());
        Ok(())
    }

    async fn count_production_samples(&self) -> Result<i64, DatabaseError> {
        let state = self.state.lock().await;
        Self::check_reachable(&state)?;
        Ok(state.samples.iter().filter(|(_, scan)| !scan.is_test).count() as i64)
    }
}
