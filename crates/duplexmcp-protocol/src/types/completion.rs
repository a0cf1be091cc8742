//! Argument autocompletion request and result types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Request;
use crate::methods;

/// Maximum completion values returned per response.
pub const MAX_COMPLETION_VALUES: usize = 100;

/// What the completion targets: a prompt argument or a resource template
/// variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CompletionReference {
    /// A prompt argument, identified by prompt name.
    #[serde(rename = "ref/prompt")]
    Prompt {
        /// Name of the prompt.
        name: String,
    },
    /// A resource template variable, identified by template URI.
    #[serde(rename = "ref/resource")]
    Resource {
        /// URI of the resource template.
        uri: String,
    },
}

/// The argument being completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionArgument {
    /// Argument name.
    pub name: String,
    /// Partial value typed so far.
    pub value: String,
}

/// Values of other arguments already chosen, for context-aware completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionContext {
    /// Previously resolved argument values.
    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

/// `completion/complete` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteRequest {
    /// What is being completed.
    #[serde(rename = "ref")]
    pub reference: CompletionReference,
    /// The argument and its partial value.
    pub argument: CompletionArgument,
    /// Other already-resolved arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<CompletionContext>,
}

/// Completion values with pagination metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Completion {
    /// Suggested values, at most [`MAX_COMPLETION_VALUES`].
    pub values: Vec<String>,
    /// Total matches available, including those beyond the cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Whether values beyond the cap exist.
    #[serde(rename = "hasMore", skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl Completion {
    /// Build a completion from raw values, truncating to the cap and filling
    /// the metadata.
    pub fn from_values(values: Vec<String>) -> Self {
        let total = values.len();
        let truncated: Vec<String> = values.into_iter().take(MAX_COMPLETION_VALUES).collect();
        Self {
            has_more: Some(total > truncated.len()),
            total: Some(total as u64),
            values: truncated,
        }
    }
}

/// `completion/complete` result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteResult {
    /// The completion set.
    pub completion: Completion,
}

impl CompleteResult {
    /// The empty completion set.
    pub fn empty() -> Self {
        Self {
            completion: Completion {
                values: Vec::new(),
                total: None,
                has_more: None,
            },
        }
    }
}

impl Request for CompleteRequest {
    const METHOD: &'static str = methods::COMPLETE;
    type Result = CompleteResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_to_cap() {
        let values: Vec<String> = (0..150).map(|i| format!("v{i}")).collect();
        let completion = Completion::from_values(values);
        assert_eq!(completion.values.len(), MAX_COMPLETION_VALUES);
        assert_eq!(completion.total, Some(150));
        assert_eq!(completion.has_more, Some(true));
    }

    #[test]
    fn test_small_set_not_truncated() {
        let completion = Completion::from_values(vec!["a".into(), "b".into()]);
        assert_eq!(completion.values.len(), 2);
        assert_eq!(completion.total, Some(2));
        assert_eq!(completion.has_more, Some(false));
    }

    #[test]
    fn test_reference_wire_shape() {
        let reference = CompletionReference::Prompt {
            name: "greet".into(),
        };
        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            serde_json::json!({"type": "ref/prompt", "name": "greet"})
        );
    }
}
