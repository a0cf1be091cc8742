//! Capability sets exchanged during the initialization handshake.
//!
//! Capabilities are opt-in feature bits. A peer may not call a method whose
//! required capability was not declared by the counterparty; the assertions
//! live in [`crate::capabilities`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Client capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClientCapabilities {
    /// Experimental, non-standard capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,

    /// Present if the client supports listing filesystem roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,

    /// Present if the client supports LLM sampling requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapability>,

    /// Present if the client supports elicitation requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elicitation: Option<ElicitationCapability>,
}

/// Server capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Experimental, non-standard capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<HashMap<String, Value>>,

    /// Present if the server can send log messages to the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingCapability>,

    /// Present if the server offers argument autocompletion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<CompletionsCapability>,

    /// Present if the server offers prompt templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,

    /// Present if the server offers readable resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,

    /// Present if the server offers callable tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Roots capability with its list-changed sub-bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RootsCapability {
    /// Whether the client emits `notifications/roots/list_changed`.
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Sampling capability (no sub-bits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SamplingCapability {}

/// Elicitation capability with its form and url modes.
///
/// A bare `elicitation: {}` on the wire means "form mode supported"; see
/// [`ElicitationCapability::normalized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ElicitationCapability {
    /// Form-mode elicitation support.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormElicitationCapability>,

    /// URL-mode elicitation support.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlElicitationCapability>,
}

/// Form-mode elicitation sub-capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FormElicitationCapability {
    /// Whether the client fills schema defaults into accepted content.
    #[serde(rename = "applyDefaults", skip_serializing_if = "Option::is_none")]
    pub apply_defaults: Option<bool>,
}

/// URL-mode elicitation sub-capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UrlElicitationCapability {}

/// Logging capability (no sub-bits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoggingCapability {}

/// Completions capability (no sub-bits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CompletionsCapability {}

/// Prompts capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PromptsCapability {
    /// Whether the server emits `notifications/prompts/list_changed`.
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Resources capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourcesCapability {
    /// Whether the server supports `resources/subscribe`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<bool>,

    /// Whether the server emits `notifications/resources/list_changed`.
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Tools capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ToolsCapability {
    /// Whether the server emits `notifications/tools/list_changed`.
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

impl ElicitationCapability {
    /// Apply the backwards-compatibility rule: an empty capability object
    /// means form mode is supported. An explicit `form` or `url` member
    /// suppresses the injection.
    pub fn normalized(&self) -> Self {
        if self.form.is_none() && self.url.is_none() {
            Self {
                form: Some(FormElicitationCapability::default()),
                url: None,
            }
        } else {
            self.clone()
        }
    }
}

impl ClientCapabilities {
    /// Normalize the on-the-wire capability object. The normalized form is
    /// authoritative for every later capability check.
    pub fn normalized(&self) -> Self {
        Self {
            elicitation: self.elicitation.as_ref().map(ElicitationCapability::normalized),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_elicitation_normalizes_to_form() {
        let caps: ClientCapabilities =
            serde_json::from_value(json!({"elicitation": {}})).unwrap();
        let normalized = caps.normalized();
        let elicitation = normalized.elicitation.unwrap();
        assert!(elicitation.form.is_some());
        assert!(elicitation.url.is_none());
    }

    #[test]
    fn test_explicit_url_suppresses_form_injection() {
        let caps: ClientCapabilities =
            serde_json::from_value(json!({"elicitation": {"url": {}}})).unwrap();
        let elicitation = caps.normalized().elicitation.unwrap();
        assert!(elicitation.form.is_none());
        assert!(elicitation.url.is_some());
    }

    #[test]
    fn test_absent_elicitation_stays_absent() {
        let caps = ClientCapabilities::default();
        assert!(caps.normalized().elicitation.is_none());
    }

    #[test]
    fn test_apply_defaults_wire_name() {
        let caps: ClientCapabilities = serde_json::from_value(
            json!({"elicitation": {"form": {"applyDefaults": true}}}),
        )
        .unwrap();
        let form = caps.elicitation.unwrap().form.unwrap();
        assert_eq!(form.apply_defaults, Some(true));
    }
}
