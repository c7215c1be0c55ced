use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::DatabaseConfig;

use super::schema;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns the process-wide connection pool.
///
/// Built once at startup and closed explicitly on shutdown. Connections are
/// opened lazily, so constructing the manager never touches the network.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl DatabaseManager {
    /// Build the pool from configuration
    pub fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let options = Self::connect_options(url, config.require_tls)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(config.idle_timeout())
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy_with(options);

        info!("Created database pool for: {}", Self::redact_url(url));
        Ok(Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        })
    }

    fn connect_options(url: &str, require_tls: bool) -> Result<PgConnectOptions, DatabaseError> {
        let options = PgConnectOptions::from_str(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        // Require encrypts without verifying the certificate
        let ssl_mode = if require_tls {
            PgSslMode::Require
        } else {
            PgSslMode::Disable
        };

        Ok(options.ssl_mode(ssl_mode))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the schema bootstrap once per manager. A failed attempt is not
    /// remembered, so the next caller retries.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        self.schema_ready
            .get_or_try_init(|| schema::bootstrap(&self.pool))
            .await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// Connection string safe for logs
    fn redact_url(url: &str) -> String {
        match url::Url::parse(url) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("****"));
                }
                parsed.into()
            }
            Err(_) => "<unparseable url>".to_string(),
        }
    }
}
