mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod paths;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::{CliConfig, RelaySettings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        completions::generate_completions(shell);
        return;
    }

    let _guard = init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file = CliConfig::load(cli.config.as_deref())?;
    let settings = RelaySettings::resolve(file, &cli.overrides)?;

    match cli.command {
        Some(Commands::Check) => commands::check(settings).await,
        Some(Commands::Run) | None => commands::run(settings).await,
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

/// Log to stderr and to a daily rolling file under the data directory.
fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    match paths::ensure_log_dir() {
        Ok(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "chatrelay.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(false),
                )
                .init();
            Some(guard)
        }
        Err(err) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            tracing::warn!("File logging disabled: {:#}", err);
            None
        }
    }
}
