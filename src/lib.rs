//! # winrs - WinRM remote shell client
//!
//! winrs opens a `cmd` shell on a Windows host over WinRM (WS-Management
//! SOAP over HTTP/HTTPS), runs commands in it, retrieves their interleaved
//! stdout/stderr, and deletes the shell. Requests are authenticated with
//! Kerberos through the HTTP `Negotiate` scheme.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   WinRmClient (shell state)                 │
//! └─────────────────────────────────────────────────────────────┘
//!               │                               │
//!               ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────────┐
//! │  soap::Envelope builders │   │  auth::Negotiator (Kerberos) │
//! └──────────────────────────┘   └──────────────────────────────┘
//!               │                               │
//!               └───────────────┬───────────────┘
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │          transport::exchange (401 Negotiate loop)           │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │               soap::SoapResponse (typed parsing)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use winrs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder("win01.corp.example.com")
//!         .use_ssl(true)
//!         .build()?;
//!     let mut client = WinRmClient::connect(config)?;
//!
//!     client.create_shell().await?;
//!     let command_id = client.execute_command("hostname").await?;
//!     let output = client.receive_output(&command_id).await?;
//!     println!("{}", output.text);
//!     client.delete_shell().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::auth::{NegotiationToken, Negotiator};
    pub use crate::client::{ShellState, WinRmClient};
    pub use crate::config::{ClientConfig, ClientConfigBuilder};
    pub use crate::error::{Result, WinRmError};
    pub use crate::soap::CommandOutput;
    pub use crate::transport::{HttpResponse, HttpTransport, Transport};
}

/// Error types and result alias.
pub mod error;

/// Connection parameters and their TOML/builder loading.
pub mod config;

/// Kerberos/SPNEGO token negotiation.
pub mod auth;

/// SOAP envelope building and response parsing.
pub mod soap;

/// HTTP transport and the Negotiate challenge loop.
pub mod transport;

/// Shell lifecycle state machine.
pub mod client;

pub use client::{ShellState, WinRmClient};
pub use config::ClientConfig;
pub use error::{Result, WinRmError};
