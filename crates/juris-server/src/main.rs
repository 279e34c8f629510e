//! Juris server binary
//!
//! Loads `.env`, resolves configuration, starts the HTTP server.

use clap::Parser;
use juris_server::{
    config::{Cli, ServerConfig},
    init_tracing, start_server, ServerError,
};
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli)?;
    init_tracing(config.log_level.as_deref());

    start_server(config).await
}
