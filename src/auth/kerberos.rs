//! Kerberos negotiator backed by the platform security library.
//!
//! Uses `cross-krb5`, which drives GSSAPI on Unix and SSPI on Windows. The
//! caller's existing credentials (ticket cache / logon session) are used;
//! no credentials are stored here.

use cross_krb5::{ClientCtx, InitiateFlags, PendingClientCtx, Step};
use tracing::{debug, trace};

use super::{decode_challenge, NegotiationToken, Negotiator};
use crate::error::{Result, WinRmError};

enum ContextState {
    Idle,
    Pending(PendingClientCtx),
    Established,
}

/// Kerberos security context for one service principal.
pub struct KerberosNegotiator {
    service_principal: String,
    state: ContextState,
}

impl KerberosNegotiator {
    /// Create a negotiator for `service_principal` (e.g. `HTTP/host@REALM`)
    pub fn new(service_principal: impl Into<String>) -> Self {
        Self {
            service_principal: service_principal.into(),
            state: ContextState::Idle,
        }
    }

    /// Target service principal
    pub fn service_principal(&self) -> &str {
        &self.service_principal
    }
}

impl std::fmt::Debug for KerberosNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            ContextState::Idle => "idle",
            ContextState::Pending(_) => "pending",
            ContextState::Established => "established",
        };
        f.debug_struct("KerberosNegotiator")
            .field("service_principal", &self.service_principal)
            .field("state", &state)
            .finish()
    }
}

impl Negotiator for KerberosNegotiator {
    fn initial_step(&mut self) -> Result<NegotiationToken> {
        debug!(spn = %self.service_principal, "Starting Kerberos security context");

        self.state = ContextState::Idle;
        let (pending, token) = ClientCtx::new(
            InitiateFlags::empty(),
            None,
            &self.service_principal,
            None,
        )
        .map_err(|e| {
            WinRmError::Authentication(format!(
                "Failed to initialize security context for '{}': {}",
                self.service_principal, e
            ))
        })?;

        let token = NegotiationToken::new(token.to_vec());
        self.state = ContextState::Pending(pending);
        trace!(len = token.as_bytes().len(), "Produced initial Kerberos token");
        Ok(token)
    }

    fn step(&mut self, challenge: &str) -> Result<NegotiationToken> {
        let input = decode_challenge(challenge)?;

        let pending = match std::mem::replace(&mut self.state, ContextState::Idle) {
            ContextState::Pending(pending) => pending,
            ContextState::Idle => {
                return Err(WinRmError::Authentication(
                    "Received a challenge before the security context was started".into(),
                ))
            }
            ContextState::Established => {
                return Err(WinRmError::Authentication(
                    "Received a challenge after the security context was established".into(),
                ))
            }
        };

        let step = pending.step(&input).map_err(|e| {
            WinRmError::Authentication(format!(
                "Security context step failed for '{}': {}",
                self.service_principal, e
            ))
        })?;

        match step {
            Step::Continue((pending, token)) => {
                let token = NegotiationToken::new(token.to_vec());
                self.state = ContextState::Pending(pending);
                trace!(len = token.as_bytes().len(), "Kerberos context continues");
                Ok(token)
            }
            Step::Finished((_ctx, token)) => {
                self.state = ContextState::Established;
                debug!(spn = %self.service_principal, "Kerberos context established");
                let bytes = token.map(|t| t.to_vec()).unwrap_or_default();
                Ok(NegotiationToken::new(bytes))
            }
        }
    }
}
