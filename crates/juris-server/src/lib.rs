//! Juris Server
//!
//! HTTP surface of the extraction service: upload, listing, lookup,
//! correction and health endpoints over the extraction pipeline.
//!
//! # Example Usage
//!
//! ```no_run
//! use juris_server::{config::{Cli, ServerConfig}, start_server};
//! use clap::Parser;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load(Cli::parse())?;
//! start_server(config).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;

use config::{ConfigError, ModelProvider, ServerConfig};
use handlers::{create_router, AppState};
use juris_llm::{LlmError, OllamaProvider, OpenRouterProvider, StructuredModel};
use juris_store::{Database, RetryingStore, StoreError};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Log filter used when neither `LOG_LEVEL` nor `RUST_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage could not be opened or closed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Model provider could not be created
    #[error("Model provider error: {0}")]
    Model(#[from] LlmError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber
///
/// `level` (from `LOG_LEVEL`) wins over `RUST_LOG`; an unparsable directive
/// falls back to [`DEFAULT_LOG_FILTER`].
pub fn init_tracing(level: Option<&str>) {
    // Already installed when embedded in a test binary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(level))
        .try_init();
}

fn log_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(directive) => EnvFilter::try_new(directive).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Open storage and create the configured model provider
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let database = Database::open(&config.database_url)?;
    let model: Arc<dyn StructuredModel> = match config.provider {
        ModelProvider::OpenRouter => Arc::new(OpenRouterProvider::with_base_url(
            &config.openrouter_base_url,
            &config.openrouter_api_key,
            &config.openrouter_model,
        )?),
        ModelProvider::Ollama => Arc::new(OllamaProvider::new(
            &config.ollama_endpoint,
            &config.ollama_model,
        )?),
    };

    Ok(AppState::new(
        model,
        RetryingStore::new(database),
        config.pipeline_config(),
    ))
}

/// Start the HTTP server
///
/// Validates the configuration, opens storage once, serves until Ctrl-C,
/// then closes storage.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;

    info!("Starting Juris server");
    info!("Bind address: {}", config.bind_addr());
    info!("Model: {} via {:?}", config.model_name(), config.provider);
    info!(
        "Size ceilings: PDF {} bytes, HTML {} bytes",
        config.max_file_size_pdf, config.max_file_size_html
    );

    let state = build_state(&config)?;
    let database = state.database.clone();
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Shutting down");
    database.close()?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
