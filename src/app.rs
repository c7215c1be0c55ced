use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header::CONTENT_TYPE, HeaderName, Method},
    middleware,
    routing::{any, get, post},
    Router,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::{ApiKeyGuard, API_KEY_HEADER};
use crate::config::{AppConfig, ClientConfig};
use crate::database::{DatabaseManager, PgScanStore, ScanStore};
use crate::handlers;
use crate::middleware::{apply_cache_policy, CachePolicy};

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScanStore>,
    pub guard: Arc<ApiKeyGuard>,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn ScanStore>, config: &AppConfig) -> Self {
        Self {
            store,
            guard: Arc::new(ApiKeyGuard::new(config.api.api_key.clone())),
            expose_error_details: config.api.expose_error_details,
        }
    }
}

pub fn app(state: AppState, client: &ClientConfig) -> Router {
    let policy = CachePolicy {
        static_max_age_secs: client.static_max_age_secs,
    };

    Router::new()
        .merge(api_routes())
        // Older clients call the /api/ paths
        .nest("/api", api_routes())
        // Client bundle, including the service worker
        .fallback_service(ServeDir::new(&client.static_dir))
        .layer(middleware::from_fn_with_state(policy, apply_cache_policy))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    use handlers::{method_not_allowed, preflight};

    Router::new()
        // Liveness answers every method
        .route("/health", any(handlers::health))
        .route(
            "/scans-bulk",
            post(handlers::scans_bulk).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/scans-count",
            get(handlers::scans_count).options(preflight).fallback(method_not_allowed),
        )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}

/// Run the HTTP server until SIGINT/SIGTERM, then close the pool.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let db = DatabaseManager::connect(&config.database).context("failed to configure database pool")?;
    let state = AppState::new(Arc::new(PgScanStore::new(db.clone())), &config);

    if !state.guard.is_configured() {
        warn!("API_KEY is not set; every protected request will be rejected");
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Sampling API listening on http://{}", bind_addr);

    axum::serve(listener, app(state, &config.client))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("failed to listen for CTRL+C: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => warn!("failed to listen for TERM signal: {}", err),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
