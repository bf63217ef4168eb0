//! winrs - run commands on Windows hosts over WinRM
//!
//! This is the main entry point for the winrs CLI.

mod cli;

use anyhow::{Context, Result};
use cli::Cli;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use winrs::WinRmClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbosity());

    let config = cli.client_config()?;
    let mut client = WinRmClient::connect(config).context("Failed to set up WinRM client")?;

    let exit_code = cli::run_command(
        &mut client,
        &cli.command_line(),
        Duration::from_millis(cli.poll_interval_ms),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await?;

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbosity >= 3))
        .with(env_filter)
        .init();
}
