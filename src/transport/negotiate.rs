//! The `401 Negotiate` challenge-response loop.
//!
//! One logical SOAP request may take several HTTP round trips: the first
//! carries the initial Kerberos token, and every `401` carrying a
//! `Negotiate <challenge>` feeds the challenge back into the negotiator and
//! resends the same body. The number of challenge-driven rounds is capped.

use tracing::{debug, warn};

use super::Transport;
use crate::auth::{negotiate_challenge, Negotiator};
use crate::error::{Result, WinRmError};
use crate::soap::SoapResponse;

/// Send `body` until it is accepted, rejected, or negotiation gives up.
///
/// Returns the parsed 2xx response. `max_rounds` bounds how many challenge
/// steps are taken after the initial token.
pub async fn exchange<T, N>(
    transport: &T,
    negotiator: &mut N,
    body: &str,
    max_rounds: u32,
) -> Result<SoapResponse>
where
    T: Transport + ?Sized,
    N: Negotiator + ?Sized,
{
    let mut token = negotiator.initial_step()?;
    let mut rounds = 0u32;

    loop {
        let response = transport
            .post(body, &token.authorization_header())
            .await?;

        if response.is_success() {
            debug!(status = response.status, rounds, "SOAP request accepted");
            return SoapResponse::parse(&response.body);
        }

        if response.status == 401 {
            let challenge =
                negotiate_challenge(response.www_authenticate.iter().map(String::as_str))
                    .ok_or_else(|| {
                        WinRmError::Authentication(
                            "401 response carried no Negotiate challenge".into(),
                        )
                    })?;

            if rounds >= max_rounds {
                warn!(rounds, "Negotiation did not converge");
                return Err(WinRmError::Authentication(format!(
                    "Negotiation not complete after {} challenge rounds",
                    rounds
                )));
            }
            rounds += 1;
            debug!(round = rounds, "Server issued Negotiate challenge");
            token = negotiator.step(challenge)?;
            continue;
        }

        let fault = SoapResponse::parse(&response.body)
            .ok()
            .and_then(|parsed| parsed.fault_reason());
        debug!(status = response.status, fault = ?fault, "SOAP request rejected");
        return Err(WinRmError::HttpStatus {
            status: response.status,
            fault,
        });
    }
}
