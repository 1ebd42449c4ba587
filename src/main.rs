//! PartBridge preview server.
//!
//! Wires configuration, logging, the object store, the project database,
//! and the conversion pipeline together and starts the HTTP server.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use partbridge_api::AppState;
use partbridge_converter::ConversionProcessor;
use partbridge_core::config::AppConfig;
use partbridge_core::error::AppError;
use partbridge_database::connection::DatabasePool;
use partbridge_database::repositories::project::ProjectRepository;

#[tokio::main]
async fn main() {
    let env = std::env::var("PARTBRIDGE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PartBridge preview server v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Object store ─────────────────────────────────────
    let store = partbridge_storage::build_object_store(&config.storage).await?;

    // ── Step 2: Project records ──────────────────────────────────
    let db = DatabasePool::connect_lazy(&config.database)?;
    let records = Arc::new(ProjectRepository::new(db.into_pool(), &config.database)?);

    // ── Step 3: Conversion pipeline ──────────────────────────────
    let processor =
        ConversionProcessor::new(&config.conversion, &config.storage, store, records)?;
    if let Some(missing) = processor.missing_configuration() {
        tracing::warn!(missing, "Conversions will fail until configuration is completed");
    }

    // ── Step 4: HTTP server ──────────────────────────────────────
    let state = AppState::new(config, processor, CancellationToken::new());
    partbridge_api::run_server(state).await?;

    tracing::info!("Server stopped");
    Ok(())
}
