use clap::Parser;
use sampling_api::cli::{self, Cli};
use sampling_api::config::AppConfig;
use sampling_api::{is_development, is_production};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, API_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sampling_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    tracing::info!("Starting Sampling API in {:?} mode", config.environment);

    if is_development!(config) {
        tracing::warn!("Development mode: error details are returned to clients");
    }
    if is_production!(config) {
        tracing::info!("Store connections require TLS");
    }

    cli::run(cli, config).await
}
