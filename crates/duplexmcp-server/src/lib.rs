//! MCP server role.
//!
//! [`Server`] wraps the shared protocol engine with the server side of the
//! handshake (version negotiation and capability normalization), typed
//! wrappers for client-addressed methods, per-session logging-level
//! filtering, completion dispatch over the completer registry, and the
//! elicitation subsystem.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![allow(clippy::module_name_repetitions)]

/// Server-initiated elicitation: `elicit_input` and completion notifiers.
pub mod elicitation;

pub use elicitation::{ElicitationCompletionNotifier, ElicitationRecord};

use dashmap::DashMap;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use duplexmcp_core::{
    ConnectionState, NotificationOptions, Protocol, ProtocolOptions, RequestOptions,
};
use duplexmcp_protocol::capabilities::{
    assert_client_capability, assert_server_capability, assert_server_notification_capability,
};
use duplexmcp_protocol::completable::{Completer, CompleterRegistry};
use duplexmcp_protocol::types::{
    ClientCapabilities, CompleteRequest, CompleteResult, Completion, CompletionReference,
    CreateMessageRequest, CreateMessageResult, EmptyResult, Implementation, InitializeRequest,
    InitializeResult, InitializedNotification, ListRootsRequest, ListRootsResult, LoggingLevel,
    LoggingMessageNotification, PingRequest, PromptListChangedNotification, Request,
    ResourceListChangedNotification, ResourceUpdatedNotification, ServerCapabilities,
    SetLevelRequest, ToolListChangedNotification,
};
use duplexmcp_protocol::validation::{JsonSchemaValidator, SchemaValidator};
use duplexmcp_protocol::{McpResult, methods, versioning};
use duplexmcp_transport_traits::Transport;

/// Server configuration.
pub struct ServerOptions {
    /// Implementation info returned from `initialize`.
    pub server_info: Implementation,
    /// Capabilities declared to clients.
    pub capabilities: ServerCapabilities,
    /// Usage instructions returned from `initialize`.
    pub instructions: Option<String>,
    /// Engine configuration.
    pub protocol: ProtocolOptions,
    /// Validator used for elicitation response schemas.
    pub validator: Arc<dyn SchemaValidator>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            server_info: Implementation::new("duplexmcp-server", env!("CARGO_PKG_VERSION")),
            capabilities: ServerCapabilities::default(),
            instructions: None,
            protocol: ProtocolOptions::default(),
            validator: Arc::new(JsonSchemaValidator::new()),
        }
    }
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("server_info", &self.server_info)
            .field("capabilities", &self.capabilities)
            .field("protocol", &self.protocol)
            .finish()
    }
}

pub(crate) struct ServerInner {
    server_info: Implementation,
    capabilities: ServerCapabilities,
    instructions: Option<String>,
    /// Client capabilities as received in `initialize`, normalized. The
    /// normalized object is authoritative.
    pub(crate) client_capabilities: RwLock<Option<ClientCapabilities>>,
    client_info: RwLock<Option<Implementation>>,
    negotiated_version: RwLock<Option<String>>,
    initialized: AtomicBool,
    /// Session id (or "default") to minimum severity.
    log_levels: DashMap<String, LoggingLevel>,
    /// Url-mode elicitations awaiting out-of-band completion.
    pub(crate) pending_elicitations: DashMap<String, ElicitationRecord>,
    completers: CompleterRegistry,
    pub(crate) validator: Arc<dyn SchemaValidator>,
}

/// The MCP server role. Cheap to clone; all clones share the connection.
#[derive(Clone)]
pub struct Server {
    pub(crate) protocol: Protocol,
    pub(crate) inner: Arc<ServerInner>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("state", &self.protocol.state())
            .field("initialized", &self.inner.initialized.load(Ordering::SeqCst))
            .finish()
    }
}

impl Server {
    /// Create a server. The `initialize`, `notifications/initialized`, and
    /// `ping` handlers are installed up front; `logging/setLevel` and
    /// `completion/complete` are installed when the matching capability is
    /// declared.
    pub fn new(options: ServerOptions) -> Self {
        let protocol = Protocol::new(options.protocol);
        let inner = Arc::new(ServerInner {
            server_info: options.server_info,
            capabilities: options.capabilities,
            instructions: options.instructions,
            client_capabilities: RwLock::new(None),
            client_info: RwLock::new(None),
            negotiated_version: RwLock::new(None),
            initialized: AtomicBool::new(false),
            log_levels: DashMap::new(),
            pending_elicitations: DashMap::new(),
            completers: CompleterRegistry::new(),
            validator: options.validator,
        });
        let server = Self { protocol, inner };
        server.install_builtin_handlers();
        server
    }

    fn install_builtin_handlers(&self) {
        let inner = self.inner.clone();
        self.protocol
            .set_request_handler(move |request: InitializeRequest, _ctx| {
                let inner = inner.clone();
                async move {
                    *inner.client_capabilities.write() =
                        Some(request.capabilities.normalized());
                    *inner.client_info.write() = Some(request.client_info);
                    let version = versioning::negotiate(&request.protocol_version).to_string();
                    *inner.negotiated_version.write() = Some(version.clone());
                    Ok(InitializeResult {
                        protocol_version: version,
                        capabilities: inner.capabilities.clone(),
                        server_info: inner.server_info.clone(),
                        instructions: inner.instructions.clone(),
                    })
                }
            });

        let inner = self.inner.clone();
        self.protocol
            .set_notification_handler(move |_notification: InitializedNotification| {
                let inner = inner.clone();
                async move {
                    inner.initialized.store(true, Ordering::SeqCst);
                    Ok(())
                }
            });

        self.protocol
            .set_request_handler(|_request: PingRequest, _ctx| async move { Ok(EmptyResult {}) });

        if self.inner.capabilities.logging.is_some() {
            let inner = self.inner.clone();
            self.protocol
                .set_request_handler(move |request: SetLevelRequest, ctx| {
                    let inner = inner.clone();
                    async move {
                        let key = ctx.session_id().unwrap_or("default").to_string();
                        inner.log_levels.insert(key, request.level);
                        Ok(EmptyResult {})
                    }
                });
        }

        if self.inner.capabilities.completions.is_some() {
            let inner = self.inner.clone();
            self.protocol
                .set_request_handler(move |request: CompleteRequest, _ctx| {
                    let inner = inner.clone();
                    async move {
                        let Some(completer) =
                            inner.completers.get(&request.reference, &request.argument.name)
                        else {
                            return Ok(CompleteResult::empty());
                        };
                        let context = request.context.as_ref().map(|c| &c.arguments);
                        let values = completer
                            .complete(&request.argument.value, context)
                            .await?;
                        Ok(CompleteResult {
                            completion: Completion::from_values(values),
                        })
                    }
                });
        }
    }

    /// The underlying engine.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Connect over a transport. The server is ready immediately; the
    /// handshake arrives from the client.
    pub async fn connect(&self, transport: Arc<dyn Transport>) -> McpResult<()> {
        self.protocol.connect(transport).await
    }

    /// Close the connection.
    pub async fn close(&self) {
        self.protocol.close().await;
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.protocol.state()
    }

    /// Whether the client finished the handshake.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    /// Capabilities the client declared, normalized.
    pub fn client_capabilities(&self) -> Option<ClientCapabilities> {
        self.inner.client_capabilities.read().clone()
    }

    /// Client implementation info from the handshake.
    pub fn client_info(&self) -> Option<Implementation> {
        self.inner.client_info.read().clone()
    }

    /// The protocol version both sides agreed on.
    pub fn negotiated_version(&self) -> Option<String> {
        self.inner.negotiated_version.read().clone()
    }

    /// Register a typed request handler. In strict mode, registration
    /// requires the server to have declared the matching capability; the
    /// check runs synchronously, before any frame is sent.
    pub fn set_request_handler<R, F, Fut>(&self, handler: F) -> McpResult<()>
    where
        R: Request,
        F: Fn(R, duplexmcp_core::RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<R::Result>> + Send + 'static,
    {
        if self.protocol.options().enforce_strict_capabilities {
            assert_server_capability(Some(&self.inner.capabilities), R::METHOD)?;
        }
        self.protocol.set_request_handler(handler);
        Ok(())
    }

    /// Attach a completer to an argument slot for `completion/complete`
    /// dispatch.
    pub fn register_completer(
        &self,
        reference: CompletionReference,
        argument: impl Into<String>,
        completer: Arc<dyn Completer>,
    ) {
        self.inner.completers.attach(reference, argument, completer);
    }

    /// Whether a completer is attached to the given argument slot.
    pub fn is_completable(&self, reference: &CompletionReference, argument: &str) -> bool {
        self.inner.completers.is_completable(reference, argument)
    }

    /// Ping the client.
    pub async fn ping(&self) -> McpResult<EmptyResult> {
        self.protocol
            .request(&PingRequest {}, RequestOptions::default())
            .await
    }

    /// Ask the client to sample from its model. Requires the client to have
    /// declared sampling support.
    pub async fn create_message(
        &self,
        request: CreateMessageRequest,
        options: RequestOptions,
    ) -> McpResult<CreateMessageResult> {
        assert_client_capability(
            self.inner.client_capabilities.read().as_ref(),
            methods::CREATE_MESSAGE,
        )?;
        self.protocol.request(&request, options).await
    }

    /// Ask the client for its filesystem roots. Requires the client to have
    /// declared roots support.
    pub async fn list_roots(&self, options: RequestOptions) -> McpResult<ListRootsResult> {
        assert_client_capability(
            self.inner.client_capabilities.read().as_ref(),
            methods::LIST_ROOTS,
        )?;
        self.protocol.request(&ListRootsRequest {}, options).await
    }

    /// Send a log message, suppressed when its severity is below the
    /// session's minimum. The minimum defaults to `info` until the client
    /// calls `logging/setLevel`; sessions are keyed by the transport session
    /// id, or `"default"` for unsession-ed transports.
    pub async fn send_logging_message(
        &self,
        params: LoggingMessageNotification,
        session_id: Option<&str>,
    ) -> McpResult<()> {
        assert_server_notification_capability(
            &self.inner.capabilities,
            methods::LOGGING_MESSAGE,
        )?;
        let key = session_id
            .map(str::to_string)
            .or_else(|| self.protocol.session_id())
            .unwrap_or_else(|| "default".to_string());
        let minimum = self
            .inner
            .log_levels
            .get(&key)
            .map(|entry| *entry.value())
            .unwrap_or(LoggingLevel::Info);
        if params.level < minimum {
            debug!(level = ?params.level, session = %key, "log message below session minimum");
            return Ok(());
        }
        self.protocol
            .notification(&params, NotificationOptions::default())
            .await
    }

    /// Announce that a subscribed resource changed.
    pub async fn send_resource_updated(&self, uri: impl Into<String>) -> McpResult<()> {
        assert_server_notification_capability(
            &self.inner.capabilities,
            methods::RESOURCE_UPDATED,
        )?;
        self.protocol
            .notification(
                &ResourceUpdatedNotification { uri: uri.into() },
                NotificationOptions::default(),
            )
            .await
    }

    /// Announce that the resource list changed.
    pub async fn send_resource_list_changed(&self) -> McpResult<()> {
        assert_server_notification_capability(
            &self.inner.capabilities,
            methods::RESOURCE_LIST_CHANGED,
        )?;
        self.protocol
            .notification(
                &ResourceListChangedNotification {},
                NotificationOptions::default(),
            )
            .await
    }

    /// Announce that the tool list changed.
    pub async fn send_tool_list_changed(&self) -> McpResult<()> {
        assert_server_notification_capability(
            &self.inner.capabilities,
            methods::TOOL_LIST_CHANGED,
        )?;
        self.protocol
            .notification(
                &ToolListChangedNotification {},
                NotificationOptions::default(),
            )
            .await
    }

    /// Announce that the prompt list changed.
    pub async fn send_prompt_list_changed(&self) -> McpResult<()> {
        assert_server_notification_capability(
            &self.inner.capabilities,
            methods::PROMPT_LIST_CHANGED,
        )?;
        self.protocol
            .notification(
                &PromptListChangedNotification {},
                NotificationOptions::default(),
            )
            .await
    }
}
