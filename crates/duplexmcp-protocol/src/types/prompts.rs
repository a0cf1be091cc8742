//! Prompt templates and retrieval types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::content::ContentBlock;
use super::core::{Cursor, Role};
use super::{Notification, Request};
use crate::methods;

/// A prompt template the server offers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    /// Prompt name, unique within the server.
    pub name: String,
    /// Human-readable display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// What the prompt produces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arguments the prompt accepts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
}

/// A single prompt argument slot. Autocompletion callbacks attach to slots
/// through the completer registry, not through this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// What the argument means.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// `prompts/list` request params.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPromptsRequest {
    /// Pagination cursor from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

/// `prompts/list` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPromptsResult {
    /// The prompts on this page.
    pub prompts: Vec<Prompt>,
    /// Cursor for the next page, if any.
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
}

impl Request for ListPromptsRequest {
    const METHOD: &'static str = methods::LIST_PROMPTS;
    type Result = ListPromptsResult;
}

/// `prompts/get` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPromptRequest {
    /// Name of the prompt to expand.
    pub name: String,
    /// Argument values keyed by argument name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<HashMap<String, String>>,
}

/// A single message in an expanded prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Who the message is attributed to.
    pub role: Role,
    /// The message content.
    pub content: ContentBlock,
}

/// `prompts/get` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPromptResult {
    /// Description of the expanded prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The expanded messages.
    pub messages: Vec<PromptMessage>,
}

impl Request for GetPromptRequest {
    const METHOD: &'static str = methods::GET_PROMPT;
    type Result = GetPromptResult;
}

/// `notifications/prompts/list_changed` params (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptListChangedNotification {}

impl Notification for PromptListChangedNotification {
    const METHOD: &'static str = methods::PROMPT_LIST_CHANGED;
}
