//! TokenGate server: session cache service and authenticating gateway.
//!
//! Main entry point that loads configuration, initializes logging, and runs
//! the selected service until Ctrl-C or SIGTERM.

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use tokengate_core::config::AppConfig;
use tokengate_core::error::AppError;

/// TokenGate session services.
#[derive(Debug, Parser)]
#[command(name = "tokengate-server", version, about)]
struct Cli {
    /// Configuration environment overlay (`config/<env>.toml`).
    #[arg(long, env = "TOKENGATE_ENV", default_value = "development")]
    env: String,

    /// Directory holding `default.toml` and the overlays.
    #[arg(long, env = "TOKENGATE_CONFIG_DIR", default_value = "config")]
    config_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the session cache RPC service.
    Cache,
    /// Run the HTTP gateway that authenticates requests against the cache.
    Gateway,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    let result = match cli.command {
        Command::Cache => tokengate_facade::run_cache_service(config, shutdown_signal()).await,
        Command::Gateway => tokengate_api::run_gateway(config, shutdown_signal()).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment.
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    AppConfig::load_from(&cli.config_dir, &cli.env)
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

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
