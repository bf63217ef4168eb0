//! Shared test utilities for the winrs test suite.
//!
//! This module provides:
//! - A scripted [`Transport`] that replays canned HTTP responses and records
//!   every request it receives
//! - A scripted [`Negotiator`] that counts initial and challenge steps
//! - SOAP response fixtures for the shell operations
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use parking_lot::RwLock;

use winrs::auth::{NegotiationToken, Negotiator};
use winrs::transport::{HttpResponse, Transport};
use winrs::{ClientConfig, Result, WinRmClient, WinRmError};

pub const RSP_NS: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell";

// ============================================================================
// Scripted Transport
// ============================================================================

/// A request observed by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub body: String,
    pub authorization: String,
}

#[derive(Debug, Default)]
struct TransportState {
    responses: RwLock<VecDeque<HttpResponse>>,
    requests: RwLock<Vec<RecordedRequest>>,
    delay: RwLock<Option<Duration>>,
}

/// Replays canned responses in order. Cloning shares the script, so a test
/// can hand one clone to the client and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<TransportState>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        let transport = Self::default();
        *transport.state.responses.write() = responses.into();
        transport
    }

    /// Queue another response.
    pub fn push(&self, response: HttpResponse) {
        self.state.responses.write().push_back(response);
    }

    /// Sleep before answering every request.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.write() = Some(delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.read().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.read().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, body: &str, authorization: &str) -> Result<HttpResponse> {
        self.state.requests.write().push(RecordedRequest {
            body: body.to_string(),
            authorization: authorization.to_string(),
        });

        let delay = *self.state.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.state.responses.write().pop_front();
        next.ok_or_else(|| WinRmError::connection("no scripted response left"))
    }
}

// ============================================================================
// Scripted Negotiator
// ============================================================================

#[derive(Debug, Default)]
struct NegotiatorState {
    initial_steps: AtomicU32,
    challenge_steps: AtomicU32,
    challenges: RwLock<Vec<String>>,
}

/// Hands out deterministic tokens and counts how often it was asked.
#[derive(Debug, Clone, Default)]
pub struct ScriptedNegotiator {
    state: Arc<NegotiatorState>,
}

impl ScriptedNegotiator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_steps(&self) -> u32 {
        self.state.initial_steps.load(Ordering::SeqCst)
    }

    pub fn challenge_steps(&self) -> u32 {
        self.state.challenge_steps.load(Ordering::SeqCst)
    }

    /// Total negotiation steps (initial + challenge-driven)
    pub fn total_steps(&self) -> u32 {
        self.initial_steps() + self.challenge_steps()
    }

    pub fn challenges(&self) -> Vec<String> {
        self.state.challenges.read().clone()
    }
}

impl Negotiator for ScriptedNegotiator {
    fn initial_step(&mut self) -> Result<NegotiationToken> {
        self.state.initial_steps.fetch_add(1, Ordering::SeqCst);
        Ok(NegotiationToken::new(b"initial".to_vec()))
    }

    fn step(&mut self, challenge: &str) -> Result<NegotiationToken> {
        let n = self.state.challenge_steps.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.challenges.write().push(challenge.to_string());
        Ok(NegotiationToken::new(format!("step-{}", n)))
    }
}

/// `Authorization` value the scripted negotiator's initial token produces.
pub fn initial_authorization() -> String {
    format!("Negotiate {}", BASE64_STANDARD.encode(b"initial"))
}

// ============================================================================
// Client Helpers
// ============================================================================

pub fn test_config() -> ClientConfig {
    ClientConfig::builder("win01.test.local")
        .timeout_ms(5_000)
        .build()
        .unwrap()
}

/// A client over scripted collaborators, plus handles to inspect them.
pub fn scripted_client(
    responses: Vec<HttpResponse>,
) -> (
    WinRmClient<ScriptedTransport, ScriptedNegotiator>,
    ScriptedTransport,
    ScriptedNegotiator,
) {
    let transport = ScriptedTransport::new(responses);
    let negotiator = ScriptedNegotiator::new();
    let client = WinRmClient::new(test_config(), transport.clone(), negotiator.clone());
    (client, transport, negotiator)
}

// ============================================================================
// Response Fixtures
// ============================================================================

pub fn ok(body: impl Into<String>) -> HttpResponse {
    HttpResponse::new(200, body)
}

pub fn challenge(token: &str) -> HttpResponse {
    HttpResponse::new(401, "").with_www_authenticate(format!("Negotiate {}", token))
}

pub fn create_response(shell_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://schemas.xmlsoap.org/ws/2004/08/addressing" xmlns:x="http://schemas.xmlsoap.org/ws/2004/09/transfer" xmlns:w="http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd" xmlns:rsp="{RSP_NS}">
  <s:Header>
    <a:Action>http://schemas.xmlsoap.org/ws/2004/09/transfer/CreateResponse</a:Action>
  </s:Header>
  <s:Body>
    <x:ResourceCreated>
      <a:Address>http://win01.test.local:5985/wsman</a:Address>
      <a:ReferenceParameters>
        <w:SelectorSet><w:Selector Name="ShellId">{shell_id}</w:Selector></w:SelectorSet>
      </a:ReferenceParameters>
    </x:ResourceCreated>
    <rsp:Shell><rsp:ShellId>{shell_id}</rsp:ShellId></rsp:Shell>
  </s:Body>
</s:Envelope>"#
    )
}

pub fn command_response(command_id: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:rsp="{RSP_NS}">
  <s:Body>
    <rsp:CommandResponse><rsp:CommandId>{command_id}</rsp:CommandId></rsp:CommandResponse>
  </s:Body>
</s:Envelope>"#
    )
}

/// Receive response with `(stream name, base64 payload)` pairs and an
/// optional exit code (present means the command is done).
pub fn receive_response(streams: &[(&str, &str)], exit_code: Option<i32>) -> String {
    let streams: String = streams
        .iter()
        .map(|(name, payload)| {
            format!(r#"<rsp:Stream Name="{name}" CommandId="CMD">{payload}</rsp:Stream>"#)
        })
        .collect();
    let state = match exit_code {
        Some(code) => format!(
            r#"<rsp:CommandState CommandId="CMD" State="{RSP_NS}/CommandState/Done"><rsp:ExitCode>{code}</rsp:ExitCode></rsp:CommandState>"#
        ),
        None => format!(
            r#"<rsp:CommandState CommandId="CMD" State="{RSP_NS}/CommandState/Running"/>"#
        ),
    };
    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:rsp="{RSP_NS}">
  <s:Body><rsp:ReceiveResponse>{streams}{state}</rsp:ReceiveResponse></s:Body>
</s:Envelope>"#
    )
}

pub fn empty_response() -> String {
    r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body/></s:Envelope>"#
        .to_string()
}

pub fn fault_response(message: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
  <s:Body>
    <s:Fault>
      <s:Code><s:Value>s:Receiver</s:Value></s:Code>
      <s:Reason><s:Text xml:lang="en-US">{message}</s:Text></s:Reason>
    </s:Fault>
  </s:Body>
</s:Envelope>"#
    )
}
