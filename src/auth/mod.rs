//! SPNEGO/Negotiate authentication.
//!
//! WinRM requests carry an `Authorization: Negotiate <token>` header. The
//! token comes from a [`Negotiator`], which drives a platform security
//! context (GSSAPI on Unix, SSPI on Windows) for the target service
//! principal. The server may answer `401` with `WWW-Authenticate: Negotiate
//! <challenge>`, which is fed back through [`Negotiator::step`].
//!
//! The concrete Kerberos backend lives behind the `gssapi` feature because
//! it links against the system Kerberos libraries.

#[cfg(feature = "gssapi")]
pub mod kerberos;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use std::fmt;

use crate::error::{Result, WinRmError};

#[cfg(feature = "gssapi")]
pub use kerberos::KerberosNegotiator;

/// Authentication scheme name used in both directions
pub const NEGOTIATE_SCHEME: &str = "Negotiate";

/// An opaque negotiation token, single-use per HTTP attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct NegotiationToken(Vec<u8>);

impl NegotiationToken {
    /// Wrap raw token bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw token bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Base64 form as carried on the wire
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.0)
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("{} {}", NEGOTIATE_SCHEME, self.to_base64())
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for NegotiationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NegotiationToken({} bytes)", self.0.len())
    }
}

/// Produces Negotiate tokens for one target service principal.
///
/// `initial_step` starts a fresh security context for every logical
/// request; `step` continues it with the server's challenge (base64, with
/// the `Negotiate ` prefix already stripped).
pub trait Negotiator: Send {
    /// First token of a new context, no server input
    fn initial_step(&mut self) -> Result<NegotiationToken>;

    /// Next token in response to a server challenge
    fn step(&mut self, challenge: &str) -> Result<NegotiationToken>;
}

impl<N: Negotiator + ?Sized> Negotiator for Box<N> {
    fn initial_step(&mut self) -> Result<NegotiationToken> {
        (**self).initial_step()
    }

    fn step(&mut self, challenge: &str) -> Result<NegotiationToken> {
        (**self).step(challenge)
    }
}

/// Extract the challenge from `WWW-Authenticate` header values.
///
/// Returns the base64 payload of the first `Negotiate <token>` value. A bare
/// `Negotiate` (no token) or another scheme is not a usable challenge.
pub fn negotiate_challenge<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().find_map(|value| {
        let value = value.trim();
        let (scheme, rest) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case(NEGOTIATE_SCHEME) {
            return None;
        }
        let token = rest.trim();
        (!token.is_empty()).then_some(token)
    })
}

/// Decode a base64 challenge into raw bytes for the security context.
pub fn decode_challenge(challenge: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD.decode(challenge.trim()).map_err(|e| {
        WinRmError::Authentication(format!("Invalid challenge encoding: {}", e))
    })
}

/// The negotiator used by [`crate::WinRmClient::connect`].
#[cfg(feature = "gssapi")]
pub fn default_negotiator(service_principal: &str) -> Result<Box<dyn Negotiator>> {
    Ok(Box::new(KerberosNegotiator::new(service_principal)))
}

/// The negotiator used by [`crate::WinRmClient::connect`].
#[cfg(not(feature = "gssapi"))]
pub fn default_negotiator(service_principal: &str) -> Result<Box<dyn Negotiator>> {
    Err(WinRmError::Authentication(format!(
        "Kerberos support for '{}' requires building with the `gssapi` feature",
        service_principal
    )))
}
