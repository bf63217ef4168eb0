//! WinRM shell client.
//!
//! [`WinRmClient`] owns at most one remote shell and walks it through its
//! lifecycle:
//!
//! ```text
//! Unopened --create_shell--> Open { shell_id } --delete_shell--> Unopened
//! ```
//!
//! Commands and output retrieval are only valid while a shell is open;
//! calling them earlier fails with [`WinRmError::Precondition`] before any
//! request is sent. Every operation takes `&mut self`, so a client cannot
//! run two exchanges at once.
//!
//! # Example
//!
//! ```rust,ignore
//! use winrs::{ClientConfig, WinRmClient};
//!
//! let config = ClientConfig::builder("win01.corp.example.com").build()?;
//! let mut client = WinRmClient::connect(config)?;
//!
//! client.create_shell().await?;
//! let command_id = client.execute_command("ipconfig /all").await?;
//! loop {
//!     let output = client.receive_output(&command_id).await?;
//!     print!("{}", output.stdout);
//!     if output.done {
//!         break;
//!     }
//! }
//! client.delete_shell().await?;
//! ```

use tracing::{debug, trace};

use crate::auth::{default_negotiator, Negotiator};
use crate::config::ClientConfig;
use crate::error::{Result, WinRmError};
use crate::soap::{CommandOutput, Envelope, SoapResponse};
use crate::transport::{exchange, HttpTransport, Transport};

/// Lifecycle of the client's remote shell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShellState {
    /// No shell has been created, or it was deleted/reset
    #[default]
    Unopened,
    /// A shell exists on the server
    Open {
        /// Server-assigned shell identifier
        shell_id: String,
    },
}

impl ShellState {
    /// Shell identifier when open
    pub fn shell_id(&self) -> Option<&str> {
        match self {
            ShellState::Open { shell_id } => Some(shell_id),
            ShellState::Unopened => None,
        }
    }

    /// Whether a shell is open
    pub fn is_open(&self) -> bool {
        matches!(self, ShellState::Open { .. })
    }
}

/// Client for one WinRM endpoint and at most one remote shell.
pub struct WinRmClient<T = HttpTransport, N = Box<dyn Negotiator>> {
    config: ClientConfig,
    envelope: Envelope,
    transport: T,
    negotiator: N,
    state: ShellState,
}

impl WinRmClient {
    /// Client using the reqwest transport and the platform Kerberos negotiator
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        let negotiator = default_negotiator(&config.service_principal())?;
        Ok(Self::new(config, transport, negotiator))
    }
}

impl<T, N> WinRmClient<T, N>
where
    T: Transport,
    N: Negotiator,
{
    /// Client over an explicit transport and negotiator
    pub fn new(config: ClientConfig, transport: T, negotiator: N) -> Self {
        let envelope = Envelope::new(&config);
        Self {
            config,
            envelope,
            transport,
            negotiator,
            state: ShellState::Unopened,
        }
    }

    /// Connection parameters
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current shell state
    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Current shell identifier, if a shell is open
    pub fn shell_id(&self) -> Option<&str> {
        self.state.shell_id()
    }

    /// Open a remote shell, or return the one already open.
    pub async fn create_shell(&mut self) -> Result<String> {
        if let ShellState::Open { shell_id } = &self.state {
            trace!(shell_id = %shell_id, "Shell already open");
            return Ok(shell_id.clone());
        }

        let body = self.envelope.create_shell();
        let shell_id = self.send(&body).await?.shell_id()?;

        debug!(host = %self.config.host(), shell_id = %shell_id, "Created WinRM shell");
        self.state = ShellState::Open {
            shell_id: shell_id.clone(),
        };
        Ok(shell_id)
    }

    /// Start `command` in the open shell and return its command identifier.
    pub async fn execute_command(&mut self, command: &str) -> Result<String> {
        let shell_id = self.require_open("execute a command")?;

        debug!(shell_id = %shell_id, command = %command, "Executing WinRM command");
        let body = self.envelope.execute_command(&shell_id, command);
        let command_id = self.send(&body).await?.command_id()?;

        trace!(command_id = %command_id, "Command started");
        Ok(command_id)
    }

    /// Retrieve whatever output is pending for `command_id`.
    ///
    /// An empty result with `done == false` means the command is still
    /// running; poll again.
    pub async fn receive_output(&mut self, command_id: &str) -> Result<CommandOutput> {
        let shell_id = self.require_open("receive output")?;

        let body = self.envelope.receive(&shell_id, command_id);
        let output = self.send(&body).await?.command_output()?;

        trace!(
            command_id = %command_id,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            done = output.done,
            "Received command output"
        );
        Ok(output)
    }

    /// Ask the server to terminate `command_id`.
    pub async fn signal_terminate(&mut self, command_id: &str) -> Result<()> {
        let shell_id = self.require_open("signal a command")?;

        let body = self.envelope.signal_terminate(&shell_id, command_id);
        self.send(&body).await?;

        debug!(command_id = %command_id, "Signalled command termination");
        Ok(())
    }

    /// Delete the open shell. A no-op when no shell is open.
    ///
    /// The shell stays open locally if the server rejects the request, so
    /// the caller can retry.
    pub async fn delete_shell(&mut self) -> Result<()> {
        let shell_id = match &self.state {
            ShellState::Open { shell_id } => shell_id.clone(),
            ShellState::Unopened => return Ok(()),
        };

        let body = self.envelope.delete_shell(&shell_id);
        self.send(&body).await?;

        self.state = ShellState::Unopened;
        debug!(shell_id = %shell_id, "Deleted WinRM shell");
        Ok(())
    }

    /// Forget the current shell without contacting the server.
    pub fn reset(&mut self) {
        if let ShellState::Open { shell_id } = &self.state {
            debug!(shell_id = %shell_id, "Resetting shell state");
        }
        self.state = ShellState::Unopened;
    }

    fn require_open(&self, action: &str) -> Result<String> {
        self.state.shell_id().map(str::to_string).ok_or_else(|| {
            WinRmError::Precondition(format!("cannot {} before a shell is created", action))
        })
    }

    async fn send(&mut self, body: &str) -> Result<SoapResponse> {
        let timeout = self.config.timeout();
        let rounds = self.config.max_negotiation_rounds();

        tokio::time::timeout(
            timeout,
            exchange(&self.transport, &mut self.negotiator, body, rounds),
        )
        .await
        .map_err(|_| WinRmError::Timeout(self.config.timeout_ms()))?
    }
}

impl<T, N> std::fmt::Debug for WinRmClient<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinRmClient")
            .field("endpoint", &self.config.endpoint_url())
            .field("state", &self.state)
            .finish()
    }
}
