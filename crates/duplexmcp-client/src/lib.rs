//! MCP client role.
//!
//! [`Client`] wraps the shared protocol engine with the client side of the
//! handshake, typed wrappers for every server-addressed method, and two
//! client-side enforcements: the elicitation handler gate (with schema
//! default injection) and tool-output validation against server-declared
//! output schemas.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![allow(clippy::module_name_repetitions)]

/// Schema default injection for accepted form elicitations.
pub mod elicitation;
/// Handler traits for server-initiated requests.
pub mod handlers;

pub use handlers::{ElicitationHandler, RootsHandler, SamplingHandler};

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use duplexmcp_core::{ConnectionState, NotificationOptions, Protocol, ProtocolOptions, RequestOptions};
use duplexmcp_protocol::capabilities::{
    assert_client_capability, assert_client_notification_capability, assert_server_capability,
};
use duplexmcp_protocol::types::{
    CallToolRequest, CallToolResult, ClientCapabilities, CompleteRequest, CompleteResult, Cursor,
    ElicitationCompleteNotification, EmptyResult, GetPromptRequest, GetPromptResult,
    Implementation, InitializeRequest, InitializeResult, InitializedNotification,
    ListPromptsRequest, ListPromptsResult, ListResourceTemplatesRequest,
    ListResourceTemplatesResult, ListResourcesRequest, ListResourcesResult, ListToolsRequest,
    ListToolsResult, LoggingLevel, PingRequest, ReadResourceRequest, ReadResourceResult, Request,
    RootsListChangedNotification, ServerCapabilities, SetLevelRequest, SubscribeResourceRequest,
    UnsubscribeResourceRequest,
};
use duplexmcp_protocol::validation::{CompiledSchema, JsonSchemaValidator, SchemaValidator};
use duplexmcp_protocol::{LATEST_PROTOCOL_VERSION, McpError, McpResult, methods, versioning};
use duplexmcp_transport_traits::Transport;

/// Client configuration.
pub struct ClientOptions {
    /// Implementation info sent in `initialize`.
    pub client_info: Implementation,
    /// Capabilities declared to the server.
    pub capabilities: ClientCapabilities,
    /// Engine configuration.
    pub protocol: ProtocolOptions,
    /// Validator used for tool-output schemas.
    pub validator: Arc<dyn SchemaValidator>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            client_info: Implementation::new("duplexmcp-client", env!("CARGO_PKG_VERSION")),
            capabilities: ClientCapabilities::default(),
            protocol: ProtocolOptions::default(),
            validator: Arc::new(JsonSchemaValidator::new()),
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("client_info", &self.client_info)
            .field("capabilities", &self.capabilities)
            .field("protocol", &self.protocol)
            .finish()
    }
}

struct ClientInner {
    client_info: Implementation,
    /// Capabilities exactly as declared, sent in `initialize`.
    capabilities: ClientCapabilities,
    /// Normalized view used for every local capability check.
    normalized_capabilities: ClientCapabilities,
    server_capabilities: RwLock<Option<ServerCapabilities>>,
    server_info: RwLock<Option<Implementation>>,
    instructions: RwLock<Option<String>>,
    negotiated_version: RwLock<Option<String>>,
    /// Tool name to compiled output-schema validator. Replaced wholesale on
    /// every successful `tools/list`.
    output_validators: Mutex<HashMap<String, Arc<dyn CompiledSchema>>>,
    validator: Arc<dyn SchemaValidator>,
}

/// The MCP client role. Cheap to clone; all clones share the connection.
#[derive(Clone)]
pub struct Client {
    protocol: Protocol,
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.protocol.state())
            .field("server_info", &*self.inner.server_info.read())
            .finish()
    }
}

impl Client {
    /// Create a client. Connect it with [`Client::connect`].
    pub fn new(options: ClientOptions) -> Self {
        let protocol = Protocol::new(options.protocol);
        // Both roles answer pings.
        protocol
            .set_request_handler(|_request: PingRequest, _ctx| async move { Ok(EmptyResult {}) });
        let normalized_capabilities = options.capabilities.normalized();
        Self {
            protocol,
            inner: Arc::new(ClientInner {
                client_info: options.client_info,
                capabilities: options.capabilities,
                normalized_capabilities,
                server_capabilities: RwLock::new(None),
                server_info: RwLock::new(None),
                instructions: RwLock::new(None),
                negotiated_version: RwLock::new(None),
                output_validators: Mutex::new(HashMap::new()),
                validator: options.validator,
            }),
        }
    }

    /// The underlying engine, for registering additional typed handlers or
    /// observing lifecycle callbacks.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Connect over a transport. Runs the initialization handshake unless the
    /// transport carries a session id marking a pre-existing conversation, in
    /// which case previously negotiated state (and caches) are kept.
    pub async fn connect(&self, transport: Arc<dyn Transport>) -> McpResult<()> {
        let resuming = transport.session_id().is_some();
        self.protocol.attach(transport.clone()).await?;
        if resuming {
            debug!("session id present; skipping initialization handshake");
            self.protocol.set_ready();
            return Ok(());
        }
        match self.handshake(transport.as_ref()).await {
            Ok(()) => {
                self.protocol.set_ready();
                Ok(())
            }
            Err(err) => {
                self.protocol.close().await;
                Err(err)
            }
        }
    }

    async fn handshake(&self, transport: &dyn Transport) -> McpResult<()> {
        let request = InitializeRequest {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: self.inner.capabilities.clone(),
            client_info: self.inner.client_info.clone(),
        };
        let result: InitializeResult =
            self.protocol.request(&request, RequestOptions::default()).await?;

        if !versioning::is_supported(&result.protocol_version) {
            return Err(McpError::InvalidRequest(format!(
                "Server's protocol version is not supported: {}",
                result.protocol_version
            )));
        }

        *self.inner.server_capabilities.write() = Some(result.capabilities);
        *self.inner.server_info.write() = Some(result.server_info);
        *self.inner.instructions.write() = result.instructions;
        *self.inner.negotiated_version.write() = Some(result.protocol_version.clone());
        transport.set_protocol_version(&result.protocol_version);

        self.protocol
            .notification(&InitializedNotification {}, NotificationOptions::default())
            .await
    }

    /// Close the connection.
    pub async fn close(&self) {
        self.protocol.close().await;
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.protocol.state()
    }

    /// Capabilities the server declared during the handshake.
    pub fn server_capabilities(&self) -> Option<ServerCapabilities> {
        self.inner.server_capabilities.read().clone()
    }

    /// Server implementation info from the handshake.
    pub fn server_info(&self) -> Option<Implementation> {
        self.inner.server_info.read().clone()
    }

    /// Server instructions from the handshake.
    pub fn instructions(&self) -> Option<String> {
        self.inner.instructions.read().clone()
    }

    /// The protocol version both sides agreed on.
    pub fn negotiated_version(&self) -> Option<String> {
        self.inner.negotiated_version.read().clone()
    }

    pub(crate) fn normalized_capabilities(&self) -> &ClientCapabilities {
        &self.inner.normalized_capabilities
    }

    fn assert_server_supports(&self, method: &str) -> McpResult<()> {
        assert_server_capability(self.inner.server_capabilities.read().as_ref(), method)
    }

    async fn gated_request<R: Request>(
        &self,
        request: &R,
        options: RequestOptions,
    ) -> McpResult<R::Result> {
        self.assert_server_supports(R::METHOD)?;
        self.protocol.request(request, options).await
    }

    /// Ping the server.
    pub async fn ping(&self) -> McpResult<EmptyResult> {
        self.protocol
            .request(&PingRequest {}, RequestOptions::default())
            .await
    }

    /// Request argument completion suggestions.
    pub async fn complete(
        &self,
        request: CompleteRequest,
        options: RequestOptions,
    ) -> McpResult<CompleteResult> {
        self.gated_request(&request, options).await
    }

    /// Set the minimum severity the server should send log messages at.
    pub async fn set_logging_level(&self, level: LoggingLevel) -> McpResult<EmptyResult> {
        self.gated_request(&SetLevelRequest { level }, RequestOptions::default())
            .await
    }

    /// Expand a prompt template.
    pub async fn get_prompt(
        &self,
        request: GetPromptRequest,
        options: RequestOptions,
    ) -> McpResult<GetPromptResult> {
        self.gated_request(&request, options).await
    }

    /// List prompt templates.
    pub async fn list_prompts(&self, cursor: Option<Cursor>) -> McpResult<ListPromptsResult> {
        self.gated_request(&ListPromptsRequest { cursor }, RequestOptions::default())
            .await
    }

    /// List resources.
    pub async fn list_resources(&self, cursor: Option<Cursor>) -> McpResult<ListResourcesResult> {
        self.gated_request(&ListResourcesRequest { cursor }, RequestOptions::default())
            .await
    }

    /// List resource templates.
    pub async fn list_resource_templates(
        &self,
        cursor: Option<Cursor>,
    ) -> McpResult<ListResourceTemplatesResult> {
        self.gated_request(
            &ListResourceTemplatesRequest { cursor },
            RequestOptions::default(),
        )
        .await
    }

    /// Read a resource by URI.
    pub async fn read_resource(
        &self,
        request: ReadResourceRequest,
        options: RequestOptions,
    ) -> McpResult<ReadResourceResult> {
        self.gated_request(&request, options).await
    }

    /// Subscribe to update notifications for a resource.
    pub async fn subscribe_resource(&self, uri: impl Into<String>) -> McpResult<EmptyResult> {
        self.gated_request(
            &SubscribeResourceRequest { uri: uri.into() },
            RequestOptions::default(),
        )
        .await
    }

    /// Stop watching a resource.
    pub async fn unsubscribe_resource(&self, uri: impl Into<String>) -> McpResult<EmptyResult> {
        self.gated_request(
            &UnsubscribeResourceRequest { uri: uri.into() },
            RequestOptions::default(),
        )
        .await
    }

    /// List tools and refresh the tool-output validator cache from the
    /// response. After this returns, the cache reflects exactly the tools in
    /// the response.
    pub async fn list_tools(&self, cursor: Option<Cursor>) -> McpResult<ListToolsResult> {
        let result: ListToolsResult = self
            .gated_request(&ListToolsRequest { cursor }, RequestOptions::default())
            .await?;

        let mut validators = HashMap::new();
        for tool in &result.tools {
            if let Some(schema) = &tool.output_schema {
                validators.insert(tool.name.clone(), self.inner.validator.get_validator(schema)?);
            }
        }
        // Clear-then-fill in one critical section.
        *self.inner.output_validators.lock() = validators;
        Ok(result)
    }

    /// Call a tool. When a cached output validator exists for the tool, the
    /// result must either be an error or carry `structuredContent` matching
    /// the declared schema.
    pub async fn call_tool(
        &self,
        request: CallToolRequest,
        options: RequestOptions,
    ) -> McpResult<CallToolResult> {
        let tool_name = request.name.clone();
        let result: CallToolResult = self.gated_request(&request, options).await?;

        let validator = self.inner.output_validators.lock().get(&tool_name).cloned();
        if let Some(validator) = validator
            && !result.is_error.unwrap_or(false)
        {
            let Some(structured) = &result.structured_content else {
                return Err(McpError::InvalidRequest(format!(
                    "Tool {tool_name} has an output schema but did not return structured content"
                )));
            };
            validator.validate(structured).map_err(|message| {
                McpError::InvalidParams(format!(
                    "Structured content does not match the tool's output schema: {message}"
                ))
            })?;
        }
        Ok(result)
    }

    /// Announce that the client's root list changed. Requires the client to
    /// have declared `roots.listChanged`.
    pub async fn send_roots_list_changed(&self) -> McpResult<()> {
        assert_client_notification_capability(
            &self.inner.normalized_capabilities,
            methods::ROOTS_LIST_CHANGED,
        )?;
        self.protocol
            .notification(
                &RootsListChangedNotification {},
                NotificationOptions::default(),
            )
            .await
    }

    /// Register a typed handler for a server-initiated request. In strict
    /// mode, registration requires the client to have declared the matching
    /// capability.
    pub fn set_request_handler<R, F, Fut>(&self, handler: F) -> McpResult<()>
    where
        R: Request,
        F: Fn(R, duplexmcp_core::RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<R::Result>> + Send + 'static,
    {
        if self.protocol.options().enforce_strict_capabilities {
            assert_client_capability(Some(&self.inner.normalized_capabilities), R::METHOD)?;
        }
        self.protocol.set_request_handler(handler);
        Ok(())
    }

    /// Register a handler for `sampling/createMessage`.
    pub fn set_sampling_handler(&self, handler: Arc<dyn SamplingHandler>) -> McpResult<()> {
        self.set_request_handler(
            move |request: duplexmcp_protocol::types::CreateMessageRequest, ctx| {
                let handler = handler.clone();
                async move { handler.create_message(request, ctx).await }
            },
        )
    }

    /// Register a handler for `roots/list`.
    pub fn set_roots_handler(&self, handler: Arc<dyn RootsHandler>) -> McpResult<()> {
        self.set_request_handler(
            move |_request: duplexmcp_protocol::types::ListRootsRequest, _ctx| {
                let handler = handler.clone();
                async move {
                    Ok(duplexmcp_protocol::types::ListRootsResult {
                        roots: handler.list_roots().await?,
                    })
                }
            },
        )
    }

    /// Register a handler for `elicitation/create`. The handler is wrapped to
    /// refuse undeclared modes and, when `form.applyDefaults` is declared, to
    /// fill schema defaults into accepted form content.
    pub fn set_elicitation_handler(&self, handler: Arc<dyn ElicitationHandler>) -> McpResult<()> {
        elicitation::install_elicitation_handler(self, handler)
    }

    /// Register a callback for `notifications/elicitation/complete`, the
    /// out-of-band completion of url-mode elicitations.
    pub fn on_elicitation_complete(
        &self,
        callback: impl Fn(ElicitationCompleteNotification) + Send + Sync + 'static,
    ) {
        let callback = Arc::new(callback);
        self.protocol.set_notification_handler(
            move |notification: ElicitationCompleteNotification| {
                let callback = callback.clone();
                async move {
                    callback(notification);
                    Ok(())
                }
            },
        );
    }

    /// Names of the tools with a cached output-schema validator. Tracks the
    /// most recent successful `tools/list` response.
    pub fn cached_output_schemas(&self) -> Vec<String> {
        self.inner.output_validators.lock().keys().cloned().collect()
    }
}
