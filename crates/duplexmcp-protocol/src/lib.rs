//! # duplexmcp Protocol
//!
//! Wire model and protocol types for the Model Context Protocol (MCP): a
//! symmetric, bidirectional JSON-RPC 2.0 messaging framework in which either
//! peer can initiate requests once connected.
//!
//! This crate is the foundation layer shared by every other duplexmcp crate.
//! It contains:
//!
//! - **JSON-RPC framing**: the four frame kinds (request, response, error,
//!   notification) and their serde representations ([`jsonrpc`])
//! - **Protocol types**: every MCP method with its params and result shapes
//!   ([`types`]), bound to method literals through the [`types::Request`] and
//!   [`types::Notification`] traits
//! - **Capability gate**: the required-capability table and the assertions
//!   both roles run before sending frames or registering handlers
//!   ([`capabilities`])
//! - **Version negotiation**: the supported protocol revisions and the
//!   server-side downgrade rule ([`versioning`])
//! - **Validator contract**: compile-a-JSON-Schema-once, validate-many
//!   ([`validation`]), with a [`jsonschema`]-backed default implementation
//! - **Completer registry**: side-channel autocompletion metadata for
//!   argument slots ([`completable`])
//!
//! The engine that moves these types over a transport lives in
//! `duplexmcp-core`; the client and server roles layer on top of that.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

/// Capability gate: required-capability table and pre-send assertions.
pub mod capabilities;
/// Side-channel completer registry for argument autocompletion.
pub mod completable;
/// Error types shared across the SDK.
pub mod error;
/// JSON-RPC 2.0 frame types.
pub mod jsonrpc;
/// All MCP protocol types (requests, notifications, results, data shapes).
pub mod types;
/// Schema validation contract and the default `jsonschema`-backed validator.
pub mod validation;
/// Protocol version constants and negotiation.
pub mod versioning;

pub use error::{McpError, McpResult, error_codes};
pub use jsonrpc::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcErrorFrame, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, JsonRpcVersion,
};
pub use types::{
    ClientCapabilities, Implementation, Notification, ProgressToken, Request, RequestId,
    ServerCapabilities,
};
pub use versioning::{LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS};

/// Well-known MCP method literals.
pub mod methods {
    /// `initialize` request (client to server).
    pub const INITIALIZE: &str = "initialize";
    /// `ping` request (either direction).
    pub const PING: &str = "ping";
    /// `tools/list` request.
    pub const LIST_TOOLS: &str = "tools/list";
    /// `tools/call` request.
    pub const CALL_TOOL: &str = "tools/call";
    /// `prompts/list` request.
    pub const LIST_PROMPTS: &str = "prompts/list";
    /// `prompts/get` request.
    pub const GET_PROMPT: &str = "prompts/get";
    /// `resources/list` request.
    pub const LIST_RESOURCES: &str = "resources/list";
    /// `resources/templates/list` request.
    pub const LIST_RESOURCE_TEMPLATES: &str = "resources/templates/list";
    /// `resources/read` request.
    pub const READ_RESOURCE: &str = "resources/read";
    /// `resources/subscribe` request.
    pub const SUBSCRIBE_RESOURCE: &str = "resources/subscribe";
    /// `resources/unsubscribe` request.
    pub const UNSUBSCRIBE_RESOURCE: &str = "resources/unsubscribe";
    /// `logging/setLevel` request.
    pub const SET_LOGGING_LEVEL: &str = "logging/setLevel";
    /// `completion/complete` request.
    pub const COMPLETE: &str = "completion/complete";
    /// `sampling/createMessage` request (server to client).
    pub const CREATE_MESSAGE: &str = "sampling/createMessage";
    /// `elicitation/create` request (server to client).
    pub const ELICIT: &str = "elicitation/create";
    /// `roots/list` request (server to client).
    pub const LIST_ROOTS: &str = "roots/list";

    /// `notifications/initialized` notification.
    pub const INITIALIZED: &str = "notifications/initialized";
    /// `notifications/cancelled` notification.
    pub const CANCELLED: &str = "notifications/cancelled";
    /// `notifications/progress` notification.
    pub const PROGRESS: &str = "notifications/progress";
    /// `notifications/message` logging notification.
    pub const LOGGING_MESSAGE: &str = "notifications/message";
    /// `notifications/resources/updated` notification.
    pub const RESOURCE_UPDATED: &str = "notifications/resources/updated";
    /// `notifications/resources/list_changed` notification.
    pub const RESOURCE_LIST_CHANGED: &str = "notifications/resources/list_changed";
    /// `notifications/tools/list_changed` notification.
    pub const TOOL_LIST_CHANGED: &str = "notifications/tools/list_changed";
    /// `notifications/prompts/list_changed` notification.
    pub const PROMPT_LIST_CHANGED: &str = "notifications/prompts/list_changed";
    /// `notifications/roots/list_changed` notification.
    pub const ROOTS_LIST_CHANGED: &str = "notifications/roots/list_changed";
    /// `notifications/elicitation/complete` notification.
    pub const ELICITATION_COMPLETE: &str = "notifications/elicitation/complete";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(methods::INITIALIZE, "initialize");
        assert_eq!(methods::LIST_TOOLS, "tools/list");
        assert_eq!(methods::CALL_TOOL, "tools/call");
        assert_eq!(methods::ELICIT, "elicitation/create");
    }

    #[test]
    fn test_version_constants() {
        assert!(SUPPORTED_PROTOCOL_VERSIONS.contains(&LATEST_PROTOCOL_VERSION));
        // Latest is first in the supported list
        assert_eq!(SUPPORTED_PROTOCOL_VERSIONS[0], LATEST_PROTOCOL_VERSION);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(error_codes::PARSE_ERROR, -32700);
        assert_eq!(error_codes::REQUEST_TIMEOUT, -32001);
    }
}
