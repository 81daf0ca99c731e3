//! Caseforge Server
//!
//! HTTP front end for the test-case generator: sessions, document upload,
//! generation with quality checks, editing, downloads, tracker export and history.

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod handlers;
pub mod session;

use caseforge_llm::{GeminiProvider, LlmError};
use caseforge_store::SqliteHistoryStore;
use config::ServerConfig;
use handlers::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Model credential absent from both environment and file
    #[error("Missing credential: set {0} in the environment or config file")]
    MissingCredential(String),

    /// Model provider could not be created
    #[error("Model provider error: {0}")]
    Provider(#[from] LlmError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `default_level`. Calling this twice is harmless.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Start the HTTP server
///
/// Builds the model provider from the API key, opens the history store when one
/// is configured, and serves until the listener fails.
pub async fn start_server(config: ServerConfig) -> Result<(), RouterError> {
    config.validate()?;

    info!("Starting Caseforge server");
    info!("Bind address: {}", config.bind_addr());
    info!("Model: {}", config.llm.model);
    info!(
        "Pipeline: chunk size {}, concurrency {}, {} attempts",
        config.pipeline.max_chunk_size, config.pipeline.concurrency, config.pipeline.max_attempts
    );

    let api_key = config
        .api_key()
        .ok_or_else(|| RouterError::MissingCredential(config::API_KEY_ENV.to_string()))?;
    let provider = Arc::new(GeminiProvider::with_endpoint(
        &config.llm.endpoint,
        api_key,
        &config.llm.model,
        config.llm.timeout_secs,
    )?);

    let mut state = AppState::new(provider, &config);
    match &config.history_db_path {
        Some(path) => match SqliteHistoryStore::new(path) {
            Ok(store) => {
                info!("History store: {}", path.display());
                state = state.with_history(store);
            }
            Err(e) => warn!("History disabled, cannot open {}: {}", path.display(), e),
        },
        None => info!("History store not configured"),
    }

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| RouterError::Server(e.to_string()))?;

    Ok(())
}
