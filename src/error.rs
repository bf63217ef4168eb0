//! Error types for winrs.
//!
//! Every failure surfaces to the caller as a [`WinRmError`]. The variants
//! follow the classes a WinRM exchange can fail in: wrong call order,
//! Kerberos negotiation, HTTP transport, timeout, and malformed responses.

use thiserror::Error;

/// Result type alias for winrs operations.
pub type Result<T> = std::result::Result<T, WinRmError>;

/// Errors that can occur while talking to a WinRM endpoint.
#[derive(Error, Debug)]
pub enum WinRmError {
    /// An operation was invoked in the wrong shell state (e.g. a command
    /// before the shell was created). No request was sent.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The Kerberos/SPNEGO handshake could not be completed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server answered with a non-2xx, non-negotiation status.
    #[error("HTTP status {status}{}", .fault.as_ref().map(|f| format!(": {f}")).unwrap_or_default())]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// SOAP fault reason from the response body, when one was present
        fault: Option<String>,
    },

    /// Connection-level failure (DNS, TCP, TLS, broken body stream).
    #[error("Connection failed: {message}")]
    Connection {
        /// What failed
        message: String,
        /// Underlying HTTP client error, when there is one
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The exchange did not complete within the configured timeout.
    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    /// The response body was not well-formed XML.
    #[error("Failed to parse response XML: {0}")]
    Parse(#[from] roxmltree::Error),

    /// The response was XML but not the WinRM shape we expected.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration is invalid or incomplete.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WinRmError {
    /// Whether this is a transport-class failure (bad status or network).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            WinRmError::HttpStatus { .. } | WinRmError::Connection { .. }
        )
    }

    /// Connection failure with no underlying client error.
    pub fn connection(message: impl Into<String>) -> Self {
        WinRmError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            WinRmError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WinRmError {
    fn from(err: reqwest::Error) -> Self {
        WinRmError::Connection {
            message: format!("HTTP request failed: {}", err),
            source: Some(err),
        }
    }
}
