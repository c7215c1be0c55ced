//! Idempotent schema bootstrap for the ingest tables.
//!
//! Every statement is existence-checked, so running the bootstrap against a
//! database that already has the tables is a no-op.

use sqlx::PgPool;
use tracing::{debug, info};

use super::manager::DatabaseError;

/// Serializes concurrent bootstraps; `CREATE ... IF NOT EXISTS` alone can
/// still race on the catalog.
const BOOTSTRAP_LOCK_KEY: i64 = 0x5343_414e_5f44_444c;

pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS samples (
        id SERIAL PRIMARY KEY,
        device_id VARCHAR(255) NOT NULL,
        local_id INTEGER,
        sample VARCHAR(255) NOT NULL,
        well_name VARCHAR(255) NOT NULL,
        block VARCHAR(255) NOT NULL,
        type VARCHAR(255) NOT NULL,
        scanned_at TIMESTAMP NOT NULL,
        scanned_by VARCHAR(255),
        is_test BOOLEAN DEFAULT FALSE,
        created_at TIMESTAMP DEFAULT NOW(),
        updated_at TIMESTAMP DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_samples_device_id ON samples(device_id)",
    "CREATE INDEX IF NOT EXISTS idx_samples_sample ON samples(sample)",
    "CREATE INDEX IF NOT EXISTS idx_samples_scanned_at ON samples(scanned_at)",
    "CREATE INDEX IF NOT EXISTS idx_samples_is_test ON samples(is_test)",
    r#"
    CREATE TABLE IF NOT EXISTS devices (
        id SERIAL PRIMARY KEY,
        device_id VARCHAR(255) UNIQUE NOT NULL,
        description TEXT,
        created_at TIMESTAMP DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sync_logs (
        id SERIAL PRIMARY KEY,
        device_id VARCHAR(255),
        scans_count INTEGER,
        status VARCHAR(50),
        error_message TEXT,
        created_at TIMESTAMP DEFAULT NOW()
    )
    "#,
];

/// Ensure `samples`, `devices` and `sync_logs` exist along with the
/// `samples` indexes.
pub async fn bootstrap(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(BOOTSTRAP_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    for statement in SCHEMA_STATEMENTS {
        debug!("Schema bootstrap: {}", statement.trim().lines().next().unwrap_or_default());
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    info!("Schema bootstrap complete ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}
