//! Response parsing.
//!
//! A response body is parsed once into an owned, flat list of elements in
//! document order. Elements are matched by namespace URI plus local name, so
//! whatever prefixes the server picks (`rsp:`, `s:`, `p:` ...) do not matter.
//!
//! Absence is reported through `Option` by the lookup helpers; the typed
//! extractors turn a missing identifier into [`WinRmError::Protocol`].

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};

use super::{COMMAND_STATE_DONE, SHELL_NS, SOAP_ENV_NS, WSMANFAULT_NS, WSMAN_NS};
use crate::error::{Result, WinRmError};

/// One parsed XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Namespace URI, if the element is namespaced
    pub namespace: Option<String>,
    /// Local name
    pub name: String,
    /// Slash-separated local names from the root, e.g. `Envelope/Body/Shell/ShellId`
    pub path: String,
    /// Attributes as (local name, value)
    pub attributes: Vec<(String, String)>,
    /// Concatenated direct text content
    pub text: String,
}

impl XmlElement {
    /// Value of the attribute with local name `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }
}

/// Output retrieved by one `Receive` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// All streams in document order, trailing whitespace trimmed
    pub text: String,
    /// Decoded stdout fragments
    pub stdout: String,
    /// Decoded stderr fragments
    pub stderr: String,
    /// Whether the server reported the command as done
    pub done: bool,
    /// Exit code, once reported
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// True when this poll returned no stream data
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// A parsed SOAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapResponse {
    elements: Vec<XmlElement>,
}

impl SoapResponse {
    /// Parse an XML body
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)?;

        let elements = doc
            .descendants()
            .filter(|node| node.is_element())
            .map(|node| {
                let mut names: Vec<&str> = node
                    .ancestors()
                    .filter(|a| a.is_element())
                    .map(|a| a.tag_name().name())
                    .collect();
                names.reverse();

                XmlElement {
                    namespace: node.tag_name().namespace().map(str::to_string),
                    name: node.tag_name().name().to_string(),
                    path: names.join("/"),
                    attributes: node
                        .attributes()
                        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
                        .collect(),
                    text: node
                        .children()
                        .filter(|child| child.is_text())
                        .filter_map(|child| child.text())
                        .collect(),
                }
            })
            .collect();

        Ok(Self { elements })
    }

    /// All elements in document order
    pub fn elements(&self) -> &[XmlElement] {
        &self.elements
    }

    /// First element with the given namespace and local name
    pub fn find(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.elements.iter().find(|e| e.is(namespace, name))
    }

    /// Every element with the given namespace and local name
    pub fn find_all<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements.iter().filter(move |e| e.is(namespace, name))
    }

    /// Trimmed text of the first element at `path` (local names, `/`-separated)
    pub fn get(&self, path: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.text.trim())
    }

    /// Shell identifier from a Create response
    pub fn shell_id(&self) -> Result<String> {
        let from_body = self
            .find_all(SHELL_NS, "ShellId")
            .map(|e| e.text.trim())
            .find(|id| !id.is_empty());
        let from_selector = || {
            self.find_all(WSMAN_NS, "Selector")
                .filter(|e| e.attribute("Name") == Some("ShellId"))
                .map(|e| e.text.trim())
                .find(|id| !id.is_empty())
        };

        from_body
            .or_else(from_selector)
            .map(str::to_string)
            .ok_or_else(|| WinRmError::Protocol("shellId not found".into()))
    }

    /// Command identifier from a Command response
    pub fn command_id(&self) -> Result<String> {
        self.find_all(SHELL_NS, "CommandId")
            .map(|e| e.text.trim())
            .find(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| WinRmError::Protocol("commandId not found".into()))
    }

    /// Decoded output, command state and exit code from a Receive response
    pub fn command_output(&self) -> Result<CommandOutput> {
        let mut output = CommandOutput::default();
        // Chunks split at arbitrary byte offsets, so decode text only once
        // all bytes of a buffer are in.
        let mut combined = Vec::new();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        for stream in self.find_all(SHELL_NS, "Stream") {
            let encoded = stream.text.trim();
            if encoded.is_empty() {
                continue;
            }
            let decoded = BASE64_STANDARD.decode(encoded).map_err(|e| {
                WinRmError::Protocol(format!("Invalid base64 in output stream: {}", e))
            })?;

            combined.extend_from_slice(&decoded);
            match stream.attribute("Name") {
                Some("stderr") => stderr.extend_from_slice(&decoded),
                _ => stdout.extend_from_slice(&decoded),
            }
        }
        output.text = String::from_utf8_lossy(&combined).trim_end().to_string();
        output.stdout = String::from_utf8_lossy(&stdout).into_owned();
        output.stderr = String::from_utf8_lossy(&stderr).into_owned();

        if let Some(state) = self.find(SHELL_NS, "CommandState") {
            output.done = state
                .attribute("State")
                .is_some_and(|s| s.ends_with(COMMAND_STATE_DONE));
        }
        if let Some(code) = self.find(SHELL_NS, "ExitCode") {
            let code = code.text.trim();
            output.exit_code = Some(code.parse().map_err(|_| {
                WinRmError::Protocol(format!("Invalid exit code: {}", code))
            })?);
        }

        Ok(output)
    }

    /// Human-readable reason of a SOAP fault, if the body is one
    pub fn fault_reason(&self) -> Option<String> {
        self.find(SOAP_ENV_NS, "Fault")?;

        let detail = self
            .find(WSMANFAULT_NS, "Message")
            .map(|e| e.text.trim())
            .filter(|m| !m.is_empty());
        let reason = || {
            self.find_all(SOAP_ENV_NS, "Text")
                .filter(|e| e.path.ends_with("Reason/Text"))
                .map(|e| e.text.trim())
                .find(|t| !t.is_empty())
        };

        detail.or_else(reason).map(str::to_string)
    }
}
