//! vivserve binary entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vivserve::{ServerConfig, VivariumServer};

/// Vivarium - sprite generation and creature deployments over HTTP
#[derive(Parser, Debug)]
#[command(name = "vivserve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve sprite generation and creature deployments", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long = "config", short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose", short = 'v')]
    verbose: bool,
}

/// Install the fmt subscriber; `RUST_LOG` takes precedence over `level`
fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the tracing subscriber")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ServerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(if cli.verbose { "debug" } else { &config.log_level })?;

    tracing::info!(
        "Vivarium starting: namespace={}, cluster={}, models={:?}",
        config.cluster.namespace,
        config.cluster.api_url,
        config.inference.fallback_models
    );

    let server = VivariumServer::new(config)?;
    server.start().await?;

    Ok(())
}
