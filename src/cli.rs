//! Command-line interface for winrs
//!
//! Runs one command in a fresh remote shell, streams its output until the
//! server reports it done, deletes the shell and exits with the remote exit
//! code.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use winrs::auth::Negotiator;
use winrs::transport::Transport;
use winrs::{ClientConfig, WinRmClient};

/// winrs - run a command on a Windows host over WinRM
#[derive(Parser, Debug, Clone)]
#[command(name = "winrs")]
#[command(version)]
#[command(about = "Run a command on a Windows host over WinRM with Kerberos", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long, env = "WINRS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target host (overrides the config file)
    #[arg(short = 'H', long, env = "WINRS_HOST")]
    pub host: Option<String>,

    /// Target port
    #[arg(short = 'p', long, env = "WINRS_PORT")]
    pub port: Option<u16>,

    /// Kerberos service principal (default: HTTP/<host>)
    #[arg(long, env = "WINRS_SPN")]
    pub spn: Option<String>,

    /// Connect over HTTPS
    #[arg(long)]
    pub ssl: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// WS-Management endpoint path
    #[arg(long)]
    pub path: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, env = "WINRS_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Delay between output polls while the command produces nothing
    #[arg(long, default_value = "500")]
    pub poll_interval_ms: u64,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Command line to run in the remote shell
    #[arg(required = true, trailing_var_arg = true, num_args = 1..)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the verbosity level
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    /// The command line as one string
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    /// Merge the config file (if any) with flag overrides
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut builder = match &self.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
                .into_builder(),
            None => {
                let host = self
                    .host
                    .as_deref()
                    .context("A host is required (--host or a config file)")?;
                ClientConfig::builder(host)
            }
        };

        if let Some(host) = &self.host {
            builder = builder.host(host);
        }
        if self.ssl {
            builder = builder.use_ssl(true);
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if self.insecure {
            builder = builder.verify_ssl(false);
        }
        if let Some(spn) = &self.spn {
            builder = builder.service_principal(spn);
        }
        if let Some(path) = &self.path {
            builder = builder.path(path);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            builder = builder.timeout_ms(timeout_ms);
        }

        builder.build().context("Invalid configuration")
    }
}

/// Run `command` in a new shell and copy its output to `out`/`err`.
///
/// The shell is deleted even when the command fails; the first error wins.
pub async fn run_command<T, N>(
    client: &mut WinRmClient<T, N>,
    command: &str,
    poll_interval: Duration,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<i32>
where
    T: Transport,
    N: Negotiator,
{
    client.create_shell().await.context("Failed to create shell")?;

    let result = stream_output(client, command, poll_interval, out, err).await;

    if let Err(e) = client.delete_shell().await {
        warn!(error = %e, "Failed to delete shell");
        if result.is_ok() {
            return Err(e).context("Failed to delete shell");
        }
    }
    result
}

async fn stream_output<T, N>(
    client: &mut WinRmClient<T, N>,
    command: &str,
    poll_interval: Duration,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<i32>
where
    T: Transport,
    N: Negotiator,
{
    let command_id = client
        .execute_command(command)
        .await
        .context("Failed to start command")?;

    loop {
        let output = client
            .receive_output(&command_id)
            .await
            .context("Failed to receive output")?;

        out.write_all(output.stdout.as_bytes())?;
        err.write_all(output.stderr.as_bytes())?;

        if output.done {
            let code = output.exit_code.unwrap_or(0);
            debug!(exit_code = code, "Remote command finished");
            out.flush()?;
            err.flush()?;
            return Ok(code);
        }
        if output.is_empty() {
            tokio::time::sleep(poll_interval).await;
        }
    }
}
