//! HTTP transport for SOAP requests.
//!
//! The [`Transport`] trait is the seam between the negotiation loop and the
//! network: one call is one HTTP POST with a prepared `Authorization`
//! header. [`HttpTransport`] is the reqwest implementation.

pub mod negotiate;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::Client;
use tracing::trace;

use crate::config::ClientConfig;
use crate::error::{Result, WinRmError};

pub use negotiate::exchange;

/// Content type for SOAP 1.2 requests
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml;charset=UTF-8";

/// The parts of an HTTP response the protocol cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Every `WWW-Authenticate` header value, in order
    pub www_authenticate: Vec<String>,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Build a response with no challenge headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            www_authenticate: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a `WWW-Authenticate` value
    pub fn with_www_authenticate(mut self, value: impl Into<String>) -> Self {
        self.www_authenticate.push(value.into());
        self
    }

    /// Whether the status is in [200, 299]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one SOAP body with a given `Authorization` header value.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to the endpoint
    async fn post(&self, body: &str, authorization: &str) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn post(&self, body: &str, authorization: &str) -> Result<HttpResponse> {
        (**self).post(body, authorization).await
    }
}

/// reqwest-backed transport for one endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
    timeout_ms: u64,
}

impl HttpTransport {
    /// Create a transport for the endpoint in `config`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_ssl())
            .build()
            .map_err(|e| {
                WinRmError::InvalidConfig(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            url: config.endpoint_url(),
            timeout_ms: config.timeout_ms(),
        })
    }

    /// Endpoint URL requests are posted to
    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_error(&self, err: reqwest::Error) -> WinRmError {
        if err.is_timeout() {
            WinRmError::Timeout(self.timeout_ms)
        } else {
            WinRmError::from(err)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, body: &str, authorization: &str) -> Result<HttpResponse> {
        trace!(url = %self.url, len = body.len(), "POST SOAP request");

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let www_authenticate = response
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        trace!(status, len = body.len(), "Received SOAP response");
        Ok(HttpResponse {
            status,
            www_authenticate,
            body,
        })
    }
}
