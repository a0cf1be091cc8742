//! Server-initiated user input requests.
//!
//! Form mode collects structured data in-band, validated against a requested
//! JSON schema. URL mode points the user at an external page for sensitive
//! flows; the final outcome typically arrives later through
//! `notifications/elicitation/complete`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::{Notification, Request};
use crate::methods;

/// Elicitation delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElicitationMode {
    /// In-band structured form.
    Form,
    /// Out-of-band URL visit.
    Url,
}

impl fmt::Display for ElicitationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Form => write!(f, "form"),
            Self::Url => write!(f, "url"),
        }
    }
}

/// `elicitation/create` request params (server to client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElicitRequest {
    /// Delivery mode. Omitted means form, for backwards compatibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ElicitationMode>,
    /// Message shown to the user.
    pub message: String,
    /// JSON schema the accepted content must satisfy (form mode).
    #[serde(rename = "requestedSchema", skip_serializing_if = "Option::is_none")]
    pub requested_schema: Option<Value>,
    /// Identifier correlating out-of-band completion (url mode).
    #[serde(rename = "elicitationId", skip_serializing_if = "Option::is_none")]
    pub elicitation_id: Option<String>,
    /// URL the user should visit (url mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ElicitRequest {
    /// Build a form-mode request with a message and requested schema.
    pub fn form(message: impl Into<String>, requested_schema: Value) -> Self {
        Self {
            mode: Some(ElicitationMode::Form),
            message: message.into(),
            requested_schema: Some(requested_schema),
            elicitation_id: None,
            url: None,
        }
    }

    /// Build a url-mode request.
    pub fn url(
        message: impl Into<String>,
        url: impl Into<String>,
        elicitation_id: impl Into<String>,
    ) -> Self {
        Self {
            mode: Some(ElicitationMode::Url),
            message: message.into(),
            requested_schema: None,
            elicitation_id: Some(elicitation_id.into()),
            url: Some(url.into()),
        }
    }
}

/// What the user did with an elicitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElicitationAction {
    /// Submitted the form or confirmed the action.
    Accept,
    /// Explicitly declined.
    Decline,
    /// Dismissed without choosing.
    Cancel,
}

/// `elicitation/create` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElicitResult {
    /// The user's action.
    pub action: ElicitationAction,
    /// Submitted content, present only on form-mode accept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Map<String, Value>>,
}

impl ElicitResult {
    /// An accept result carrying the given content.
    pub fn accept(content: Map<String, Value>) -> Self {
        Self {
            action: ElicitationAction::Accept,
            content: Some(content),
        }
    }

    /// A decline result.
    pub fn decline() -> Self {
        Self {
            action: ElicitationAction::Decline,
            content: None,
        }
    }

    /// A cancel result.
    pub fn cancel() -> Self {
        Self {
            action: ElicitationAction::Cancel,
            content: None,
        }
    }
}

impl Request for ElicitRequest {
    const METHOD: &'static str = methods::ELICIT;
    type Result = ElicitResult;
}

/// `notifications/elicitation/complete` params, finishing a url-mode
/// elicitation out of band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElicitationCompleteNotification {
    /// Identifier of the elicitation that finished.
    #[serde(rename = "elicitationId")]
    pub elicitation_id: String,
}

impl Notification for ElicitationCompleteNotification {
    const METHOD: &'static str = methods::ELICITATION_COMPLETE;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(
            serde_json::to_value(ElicitationMode::Form).unwrap(),
            json!("form")
        );
        assert_eq!(
            serde_json::to_value(ElicitationMode::Url).unwrap(),
            json!("url")
        );
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(
            serde_json::to_value(ElicitationAction::Accept).unwrap(),
            json!("accept")
        );
    }

    #[test]
    fn test_omitted_mode_parses() {
        let request: ElicitRequest =
            serde_json::from_value(json!({"message": "hi"})).unwrap();
        assert!(request.mode.is_none());
    }
}
