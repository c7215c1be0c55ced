use async_trait::async_trait;
use sqlx::PgExecutor;
use tracing::{debug, warn};

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{BatchOutcome, InsertOutcome, NewSyncLog, ValidScan};

/// Persistence seam used by the handlers.
///
/// `insert_batch` is atomic: either every scan plus the success log is
/// committed, or nothing is.
#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn ensure_schema(&self) -> Result<(), DatabaseError>;

    /// Insert `scans` in order inside one transaction. Commits together with
    /// `success_log` only when the returned outcome is committable.
    async fn insert_batch(
        &self,
        scans: &[ValidScan],
        success_log: &NewSyncLog,
    ) -> Result<BatchOutcome, DatabaseError>;

    /// Standalone sync log write, used on the failure path
    async fn log_sync(&self, entry: &NewSyncLog) -> Result<(), DatabaseError>;

    /// Count of samples with `is_test = false`
    async fn count_production_samples(&self) -> Result<i64, DatabaseError>;
}

const INSERT_SAMPLE: &str = r#"
    INSERT INTO samples (
        device_id, local_id, sample, well_name, block, type,
        scanned_at, scanned_by, is_test, created_at, updated_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
    RETURNING id
"#;

const INSERT_SYNC_LOG: &str = r#"
    INSERT INTO sync_logs (device_id, scans_count, status, error_message, created_at)
    VALUES ($1, $2, $3, $4, NOW())
"#;

const COUNT_PRODUCTION: &str = "SELECT COUNT(*) FROM samples WHERE is_test = false";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgScanStore {
    db: DatabaseManager,
}

impl PgScanStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    async fn insert_sync_log<'e, E>(executor: E, entry: &NewSyncLog) -> Result<(), DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(INSERT_SYNC_LOG)
            .bind(&entry.device_id)
            .bind(entry.scans_count)
            .bind(entry.status.as_str())
            .bind(entry.error_message.as_deref())
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ScanStore for PgScanStore {
    async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        self.db.ensure_schema().await
    }

    async fn insert_batch(
        &self,
        scans: &[ValidScan],
        success_log: &NewSyncLog,
    ) -> Result<BatchOutcome, DatabaseError> {
        let mut tx = self.db.pool().begin().await?;
        let mut outcome = BatchOutcome::new(scans.len());

        for (index, scan) in scans.iter().enumerate() {
            let inserted = sqlx::query_scalar::<_, i32>(INSERT_SAMPLE)
                .bind(&scan.device_id)
                .bind(scan.local_id)
                .bind(&scan.sample)
                .bind(&scan.well_name)
                .bind(&scan.block)
                .bind(&scan.scan_type)
                .bind(scan.scanned_at.naive_utc())
                .bind(&scan.scanned_by)
                .bind(scan.is_test)
                .fetch_one(&mut *tx)
                .await;

            match inserted {
                Ok(server_id) => outcome.push(InsertOutcome::Inserted { index, server_id }),
                Err(err) => {
                    // The transaction is aborted from here on; stop at the first failure
                    warn!("Insert of scan {} failed: {}", index, err);
                    outcome.push(InsertOutcome::Failed {
                        index,
                        reason: err.to_string(),
                    });
                    break;
                }
            }
        }

        if !outcome.is_committable() {
            tx.rollback().await?;
            return Ok(outcome);
        }

        Self::insert_sync_log(&mut *tx, success_log).await?;
        tx.commit().await?;

        debug!("Committed batch of {} scans", scans.len());
        Ok(outcome)
    }

    async fn log_sync(&self, entry: &NewSyncLog) -> Result<(), DatabaseError> {
        Self::insert_sync_log(self.db.pool(), entry).await
    }

    async fn count_production_samples(&self) -> Result<i64, DatabaseError> {
        let total = sqlx::query_scalar::<_, i64>(COUNT_PRODUCTION)
            .fetch_one(self.db.pool())
            .await?;
        Ok(total)
    }
}
