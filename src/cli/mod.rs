use clap::{Parser, Subcommand};

use crate::app;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgScanStore, ScanStore};

#[derive(Parser)]
#[command(name = "sampling-api")]
#[command(about = "Scan ingest backend for the sampling client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Create tables and indexes if they are missing, then exit")]
    InitDb,

    #[command(about = "Print the number of non-test samples on the server")]
    Count,
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.api.port = port;
            }
            app::serve(config).await
        }
        Commands::InitDb => {
            let db = DatabaseManager::connect(&config.database)?;
            let result = db.ensure_schema().await;
            db.close().await;
            result?;
            println!("Schema is up to date");
            Ok(())
        }
        Commands::Count => {
            let db = DatabaseManager::connect(&config.database)?;
            let store = PgScanStore::new(db.clone());
            let result = async {
                store.ensure_schema().await?;
                store.count_production_samples().await
            }
            .await;
            db.close().await;
            println!("{}", result?);
            Ok(())
        }
    }
}
