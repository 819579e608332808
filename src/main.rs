//! comparador - Batch price-comparison API for Uruguayan VTEX storefronts
//!
//! Receives grocery item lists over HTTP and answers with per-item price
//! matches from competitor supermarkets.

use anyhow::Result;
use clap::Parser;
use comparador::config::Config;
use comparador::server::{self, AppState};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "comparador",
    version,
    about = "Batch price-comparison API for Uruguayan VTEX storefronts"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config file and PORT)
    #[arg(short, long)]
    listen: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(listen) = cli.listen {
        config.listen_address = listen;
    }

    if config.api_key.as_deref().map_or(true, str::is_empty) {
        anyhow::bail!(
            "No API key configured. Set the API_KEY environment variable or api_key in config.toml."
        );
    }

    let state = AppState::new(config)?;
    server::run(state).await
}
