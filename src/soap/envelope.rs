//! Request envelopes for the WinRM shell operations.
//!
//! Each builder returns a complete SOAP 1.2 envelope carrying a fresh
//! `uuid:` message identifier, the `cmd` shell resource URI and a fixed
//! 60 second operation timeout. Caller-supplied values are XML-escaped.

use uuid::Uuid;

use super::{
    xml_escape, ACTION_COMMAND, ACTION_CREATE, ACTION_DELETE, ACTION_RECEIVE, ACTION_SIGNAL,
    ANONYMOUS_ADDRESS, SHELL_NS, SHELL_RESOURCE_URI, SIGNAL_TERMINATE, SOAP_ENV_NS, WSA_NS,
    WSMAN_NS,
};
use crate::config::ClientConfig;

/// WS-Management operation timeout sent with every request
pub const OPERATION_TIMEOUT: &str = "PT60S";

/// Maximum envelope size advertised to the server
pub const MAX_ENVELOPE_SIZE: u32 = 153_600;

/// Envelope builder bound to one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    to: String,
    codepage: u32,
}

impl Envelope {
    /// Builder addressing the endpoint described by `config`
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            to: config.endpoint_url(),
            codepage: config.codepage(),
        }
    }

    /// The `To` address written into every header
    pub fn to_address(&self) -> &str {
        &self.to
    }

    /// Create a new `cmd` shell with stdin in and stdout/stderr out
    pub fn create_shell(&self) -> String {
        let options = format!(
            r#"
    <w:OptionSet xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
      <w:Option Name="WINRS_NOPROFILE">FALSE</w:Option>
      <w:Option Name="WINRS_CODEPAGE">{}</w:Option>
    </w:OptionSet>"#,
            self.codepage
        );
        let body = r#"
    <rsp:Shell>
      <rsp:InputStreams>stdin</rsp:InputStreams>
      <rsp:OutputStreams>stdout stderr</rsp:OutputStreams>
    </rsp:Shell>
  "#;
        self.render(ACTION_CREATE, None, &options, Some(body))
    }

    /// Run `command` in the shell identified by `shell_id`
    pub fn execute_command(&self, shell_id: &str, command: &str) -> String {
        let options = r#"
    <w:OptionSet>
      <w:Option Name="WINRS_CONSOLEMODE_STDIN">TRUE</w:Option>
      <w:Option Name="WINRS_SKIP_CMD_SHELL">FALSE</w:Option>
    </w:OptionSet>"#;
        let body = format!(
            r#"
    <rsp:CommandLine>
      <rsp:Command>{}</rsp:Command>
    </rsp:CommandLine>
  "#,
            xml_escape(command)
        );
        self.render(ACTION_COMMAND, Some(shell_id), options, Some(&body))
    }

    /// Request pending stdout/stderr for `command_id`
    pub fn receive(&self, shell_id: &str, command_id: &str) -> String {
        let body = format!(
            r#"
    <rsp:Receive>
      <rsp:DesiredStream CommandId="{}">stdout stderr</rsp:DesiredStream>
    </rsp:Receive>
  "#,
            xml_escape(command_id)
        );
        self.render(ACTION_RECEIVE, Some(shell_id), "", Some(&body))
    }

    /// Ask the server to terminate `command_id`
    pub fn signal_terminate(&self, shell_id: &str, command_id: &str) -> String {
        let body = format!(
            r#"
    <rsp:Signal CommandId="{}">
      <rsp:Code>{SIGNAL_TERMINATE}</rsp:Code>
    </rsp:Signal>
  "#,
            xml_escape(command_id)
        );
        self.render(ACTION_SIGNAL, Some(shell_id), "", Some(&body))
    }

    /// Delete the shell; empty body, selector only
    pub fn delete_shell(&self, shell_id: &str) -> String {
        self.render(ACTION_DELETE, Some(shell_id), "", None)
    }

    fn render(
        &self,
        action: &str,
        shell_id: Option<&str>,
        extra_headers: &str,
        body: Option<&str>,
    ) -> String {
        let selector = shell_id
            .map(|id| {
                format!(
                    r#"
    <w:SelectorSet>
      <w:Selector Name="ShellId">{}</w:Selector>
    </w:SelectorSet>"#,
                    xml_escape(id)
                )
            })
            .unwrap_or_default();
        let body = match body {
            Some(content) => format!("<s:Body>{}</s:Body>", content),
            None => "<s:Body/>".to_string(),
        };

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="{SOAP_ENV_NS}" xmlns:a="{WSA_NS}" xmlns:w="{WSMAN_NS}" xmlns:rsp="{SHELL_NS}">
  <s:Header>
    <a:To>{}</a:To>
    <w:ResourceURI s:mustUnderstand="true">{SHELL_RESOURCE_URI}</w:ResourceURI>
    <a:ReplyTo>
      <a:Address s:mustUnderstand="true">{ANONYMOUS_ADDRESS}</a:Address>
    </a:ReplyTo>
    <a:Action s:mustUnderstand="true">{}</a:Action>
    <a:MessageID>{}</a:MessageID>
    <w:MaxEnvelopeSize s:mustUnderstand="true">{MAX_ENVELOPE_SIZE}</w:MaxEnvelopeSize>
    <w:Locale xml:lang="en-US" s:mustUnderstand="false"/>
    <w:OperationTimeout>{OPERATION_TIMEOUT}</w:OperationTimeout>{}{}
  </s:Header>
  {}
</s:Envelope>"#,
            xml_escape(&self.to),
            action,
            message_id(),
            selector,
            extra_headers,
            body
        )
    }
}

/// Fresh correlation identifier in the `uuid:` form WinRM expects
fn message_id() -> String {
    format!("uuid:{}", Uuid::new_v4().to_string().to_uppercase())
}
