//! Client configuration
//!
//! [`ClientConfig`] holds the connection parameters for one WinRM endpoint.
//! It is assembled once, either through [`ClientConfigBuilder`] or from a
//! TOML file, and is read-only afterwards.
//!
//! ```toml
//! host = "win01.corp.example.com"
//! port = 5986
//! use_ssl = true
//! service_principal = "HTTP/win01.corp.example.com@CORP.EXAMPLE.COM"
//! timeout_ms = 30000
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{Result, WinRmError};

/// Default WinRM HTTP port
pub const DEFAULT_WINRM_PORT: u16 = 5985;

/// Default WinRM HTTPS port
pub const DEFAULT_WINRM_SSL_PORT: u16 = 5986;

/// Default WS-Management endpoint path
pub const DEFAULT_PATH: &str = "/wsman";

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Default console code page (UTF-8)
pub const DEFAULT_CODEPAGE: u32 = 65001;

/// Default cap on challenge-driven negotiation retries per request
pub const DEFAULT_MAX_NEGOTIATION_ROUNDS: u32 = 3;

/// Immutable WinRM connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    host: String,
    port: u16,
    service_principal: Option<String>,
    use_ssl: bool,
    verify_ssl: bool,
    path: String,
    timeout_ms: u64,
    codepage: u32,
    max_negotiation_rounds: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_WINRM_PORT,
            service_principal: None,
            use_ssl: false,
            verify_ssl: true,
            path: DEFAULT_PATH.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            codepage: DEFAULT_CODEPAGE,
            max_negotiation_rounds: DEFAULT_MAX_NEGOTIATION_ROUNDS,
        }
    }
}

impl ClientConfig {
    /// Start building a config for `host`
    pub fn builder(host: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(host)
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            WinRmError::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)
            .map_err(|e| WinRmError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Turn this config back into a builder to override individual fields
    pub fn into_builder(self) -> ClientConfigBuilder {
        ClientConfigBuilder { config: self }
    }

    /// Target hostname or IP address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the endpoint is reached over HTTPS
    pub fn use_ssl(&self) -> bool {
        self.use_ssl
    }

    /// Whether TLS certificates are verified (only meaningful with `use_ssl`)
    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// Endpoint path, e.g. `/wsman`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request timeout covering a full exchange, negotiation included
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Request timeout in milliseconds
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Console code page requested for new shells
    pub fn codepage(&self) -> u32 {
        self.codepage
    }

    /// Maximum number of challenge-driven negotiation steps per request
    pub fn max_negotiation_rounds(&self) -> u32 {
        self.max_negotiation_rounds
    }

    /// Kerberos service principal for the target, `HTTP/<host>` unless set
    pub fn service_principal(&self) -> String {
        self.service_principal
            .clone()
            .unwrap_or_else(|| format!("HTTP/{}", self.host))
    }

    /// Full WS-Management endpoint URL, also used as the SOAP `To` address
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(WinRmError::InvalidConfig("host must not be empty".into()));
        }
        if !self.path.starts_with('/') {
            return Err(WinRmError::InvalidConfig(format!(
                "path must start with '/': {}",
                self.path
            )));
        }
        if self.timeout_ms == 0 {
            return Err(WinRmError::InvalidConfig(
                "timeout_ms must be greater than zero".into(),
            ));
        }
        if let Some(spn) = &self.service_principal {
            if spn.trim().is_empty() {
                return Err(WinRmError::InvalidConfig(
                    "service_principal must not be empty when set".into(),
                ));
            }
        }
        Url::parse(&self.endpoint_url()).map_err(|e| {
            WinRmError::InvalidConfig(format!("Invalid endpoint '{}': {}", self.endpoint_url(), e))
        })?;
        Ok(())
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a builder for `host` with default settings
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                host: host.into(),
                ..Default::default()
            },
        }
    }

    /// Set the host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable HTTPS; switches the default port to 5986
    pub fn use_ssl(mut self, use_ssl: bool) -> Self {
        self.config.use_ssl = use_ssl;
        if use_ssl && self.config.port == DEFAULT_WINRM_PORT {
            self.config.port = DEFAULT_WINRM_SSL_PORT;
        }
        self
    }

    /// Set TLS certificate verification
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.config.verify_ssl = verify;
        self
    }

    /// Set the Kerberos service principal name
    pub fn service_principal(mut self, spn: impl Into<String>) -> Self {
        self.config.service_principal = Some(spn.into());
        self
    }

    /// Set the endpoint path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the request timeout in milliseconds
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// Set the console code page
    pub fn codepage(mut self, codepage: u32) -> Self {
        self.config.codepage = codepage;
        self
    }

    /// Set the negotiation retry cap
    pub fn max_negotiation_rounds(mut self, rounds: u32) -> Self {
        self.config.max_negotiation_rounds = rounds;
        self
    }

    /// Validate and produce the config
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
