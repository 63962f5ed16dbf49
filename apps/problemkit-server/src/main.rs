#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod routes;
mod shutdown;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use problemkit::ApiBehavior;

use crate::config::AppConfig;
use crate::routes::AppState;

/// problemkit demo server - Problem Details responses for an axum API
#[derive(Parser)]
#[command(name = "problemkit-server")]
#[command(about = "problemkit demo server - Problem Details responses for an axum API")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // 1) defaults -> 2) YAML (if provided) -> 3) env (PROBLEMKIT__*) -> 4) CLI overrides
    let mut config = AppConfig::load_layered(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    problemkit::init_logging(&config.logging)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    config
        .api_behavior
        .build_options()
        .context("invalid api_behavior configuration")?;
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    let options = config
        .api_behavior
        .build_options()
        .context("invalid api_behavior configuration")?;
    let app = routes::router(ApiBehavior::new(options), AppState::default());

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "problemkit-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_shutdown())
        .await?;

    tracing::info!("problemkit-server stopped");
    Ok(())
}
