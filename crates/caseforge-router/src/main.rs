//! Caseforge server binary
//!
//! Starts the HTTP server for document-driven test-case generation.

use anyhow::Context;
use caseforge_router::{config::ServerConfig, init_tracing, start_server};
use clap::Parser;
use std::path::PathBuf;

/// Generate, check and export QA test cases from requirement documents
#[derive(Debug, Parser)]
#[command(name = "caseforge-server", version, about)]
struct Cli {
    /// Load configuration from a TOML file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; real environment variables take precedence
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            eprintln!("Warning: No config file specified, using default development configuration");
            ServerConfig::default_dev_config()
        }
    };
    if let Some(port) = cli.port {
        config.bind_port = port;
    }

    init_tracing(&config.log_level);

    start_server(config).await?;
    Ok(())
}
