//! Handler traits for server-initiated requests.
//!
//! MCP is bidirectional: once connected, the server can ask the client to
//! sample from its model, list filesystem roots, or elicit input from the
//! user. Implement the matching trait and register it on the [`crate::Client`].

use async_trait::async_trait;

use duplexmcp_core::RequestContext;
use duplexmcp_protocol::McpResult;
use duplexmcp_protocol::types::{
    CreateMessageRequest, CreateMessageResult, ElicitRequest, ElicitResult, Root,
};

/// Handles `sampling/createMessage` requests from servers.
#[async_trait]
pub trait SamplingHandler: Send + Sync {
    /// Run a completion against the client's model and return the sampled
    /// message. Long-running implementations should observe
    /// `ctx.cancellation()`.
    async fn create_message(
        &self,
        request: CreateMessageRequest,
        ctx: RequestContext,
    ) -> McpResult<CreateMessageResult>;
}

/// Handles `roots/list` requests from servers.
#[async_trait]
pub trait RootsHandler: Send + Sync {
    /// The roots the client currently exposes.
    async fn list_roots(&self) -> McpResult<Vec<Root>>;
}

/// Handles `elicitation/create` requests from servers.
///
/// The client wraps registered handlers: undeclared modes are refused before
/// the handler runs, and accepted form content gets schema defaults injected
/// when the client declared `form.applyDefaults`.
#[async_trait]
pub trait ElicitationHandler: Send + Sync {
    /// Present the elicitation to the user and return their response.
    async fn handle(&self, request: ElicitRequest) -> McpResult<ElicitResult>;
}
