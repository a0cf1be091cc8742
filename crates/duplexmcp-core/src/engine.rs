//! The protocol multiplexer.
//!
//! One [`Protocol`] instance drives one connection. Outgoing requests get a
//! monotonically increasing integer id and a pending-table entry registered
//! before the frame is sent, so a response racing the send cannot be lost.
//! Incoming frames are classified structurally: requests dispatch to typed
//! handlers on their own tasks, responses and error frames resolve pending
//! entries, and notifications route to the cancellation, progress, or
//! user-registered paths.

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use duplexmcp_protocol::jsonrpc::{
    JsonRpcErrorFrame, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
};
use duplexmcp_protocol::types::core::{
    META_PROGRESS_TOKEN, META_RELATED_REQUEST_ID, get_meta, insert_meta,
};
use duplexmcp_protocol::types::{
    CancelledNotification, Notification, Progress, ProgressNotification, ProgressToken, Request,
    RequestId,
};
use duplexmcp_protocol::{McpError, McpResult, methods};
use duplexmcp_transport_traits::Transport;

use crate::cancellation::CancellationSignal;
use crate::context::RequestContext;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Callback invoked for each progress notification matching a request.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

type RequestHandlerFn =
    Arc<dyn Fn(Option<Value>, RequestContext) -> BoxFuture<'static, McpResult<Value>> + Send + Sync>;
type NotificationHandlerFn =
    Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, McpResult<()>> + Send + Sync>;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport attached.
    Disconnected,
    /// Transport starting.
    Connecting,
    /// Transport up, handshake in flight.
    Initializing,
    /// Fully connected.
    Ready,
    /// Teardown in progress.
    Closing,
    /// Torn down.
    Closed,
}

/// Per-connection engine configuration.
#[derive(Debug, Clone)]
pub struct ProtocolOptions {
    /// Gate handler registration by self-declared capabilities. The roles
    /// consult this flag; the engine itself stays capability-agnostic.
    pub enforce_strict_capabilities: bool,
    /// Notification methods eligible for per-tick coalescing.
    pub debounced_notification_methods: HashSet<String>,
}

impl Default for ProtocolOptions {
    fn default() -> Self {
        Self {
            enforce_strict_capabilities: false,
            debounced_notification_methods: [
                methods::TOOL_LIST_CHANGED,
                methods::PROMPT_LIST_CHANGED,
                methods::RESOURCE_LIST_CHANGED,
                methods::ROOTS_LIST_CHANGED,
            ]
            .iter()
            .map(|m| (*m).to_string())
            .collect(),
        }
    }
}

/// Per-request options.
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Per-request timeout. `None` means [`DEFAULT_REQUEST_TIMEOUT`].
    pub timeout: Option<Duration>,
    /// Hard cap on total wait, including timeout resets.
    pub max_total_timeout: Option<Duration>,
    /// Restart the per-request timeout whenever progress arrives.
    pub reset_timeout_on_progress: bool,
    /// External cancellation signal.
    pub signal: Option<CancellationSignal>,
    /// Progress callback; its presence attaches a progress token.
    pub on_progress: Option<ProgressCallback>,
    /// Correlate this request with an inbound request being serviced.
    pub related_request_id: Option<RequestId>,
}

impl RequestOptions {
    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach an external cancellation signal.
    pub fn with_signal(mut self, signal: CancellationSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("timeout", &self.timeout)
            .field("max_total_timeout", &self.max_total_timeout)
            .field("reset_timeout_on_progress", &self.reset_timeout_on_progress)
            .field("has_signal", &self.signal.is_some())
            .field("has_progress", &self.on_progress.is_some())
            .field("related_request_id", &self.related_request_id)
            .finish()
    }
}

/// Per-notification options.
#[derive(Debug, Clone, Default)]
pub struct NotificationOptions {
    /// Correlate this notification with an inbound request being serviced.
    pub related_request_id: Option<RequestId>,
}

/// Resettable per-request deadline, bounded by an optional hard cap.
struct DeadlineState {
    deadline: Mutex<Instant>,
    hard_cap: Option<Instant>,
    timeout: Duration,
    reset_on_progress: bool,
}

impl DeadlineState {
    fn new(timeout: Duration, max_total: Option<Duration>, reset_on_progress: bool) -> Self {
        let now = Instant::now();
        let hard_cap = max_total.map(|d| now + d);
        let mut deadline = now + timeout;
        if let Some(cap) = hard_cap {
            deadline = deadline.min(cap);
        }
        Self {
            deadline: Mutex::new(deadline),
            hard_cap,
            timeout,
            reset_on_progress,
        }
    }

    fn current(&self) -> Instant {
        *self.deadline.lock()
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.current()
    }

    /// Push the deadline out by one timeout interval, never past the cap.
    fn reset(&self) {
        if !self.reset_on_progress {
            return;
        }
        let mut candidate = Instant::now() + self.timeout;
        if let Some(cap) = self.hard_cap {
            candidate = candidate.min(cap);
        }
        *self.deadline.lock() = candidate;
    }
}

/// One outstanding outgoing request. Owned exclusively by the engine; at most
/// one entry exists per id, removed on response, error, cancel, timeout, or
/// close.
struct PendingEntry {
    method: &'static str,
    resolver: oneshot::Sender<Result<Value, McpError>>,
    progress: Option<ProgressCallback>,
    deadline: Arc<DeadlineState>,
}

struct ProtocolInner {
    options: ProtocolOptions,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    next_request_id: AtomicI64,
    pending: Mutex<HashMap<i64, PendingEntry>>,
    request_handlers: RwLock<HashMap<String, RequestHandlerFn>>,
    notification_handlers: RwLock<HashMap<String, NotificationHandlerFn>>,
    in_flight: Mutex<HashMap<RequestId, CancellationSignal>>,
    debounced: Mutex<HashSet<&'static str>>,
    state: Mutex<ConnectionState>,
    closed: AtomicBool,
    read_task: Mutex<Option<JoinHandle<()>>>,
    on_close: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    on_error: Mutex<Option<Box<dyn Fn(McpError) + Send + Sync>>>,
}

/// The protocol multiplexer for one connection. Cheap to clone; all clones
/// share state.
#[derive(Clone)]
pub struct Protocol {
    inner: Arc<ProtocolInner>,
}

impl fmt::Debug for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Protocol")
            .field("state", &self.state())
            .field("pending", &self.inner.pending.lock().len())
            .finish()
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::new(ProtocolOptions::default())
    }
}

impl Protocol {
    /// Create an engine with the given options. Attach a transport with
    /// [`Protocol::connect`] or [`Protocol::attach`].
    pub fn new(options: ProtocolOptions) -> Self {
        Self {
            inner: Arc::new(ProtocolInner {
                options,
                transport: RwLock::new(None),
                next_request_id: AtomicI64::new(1),
                pending: Mutex::new(HashMap::new()),
                request_handlers: RwLock::new(HashMap::new()),
                notification_handlers: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                debounced: Mutex::new(HashSet::new()),
                state: Mutex::new(ConnectionState::Disconnected),
                closed: AtomicBool::new(false),
                read_task: Mutex::new(None),
                on_close: Mutex::new(None),
                on_error: Mutex::new(None),
            }),
        }
    }

    /// Engine configuration.
    pub fn options(&self) -> &ProtocolOptions {
        &self.inner.options
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    /// Session id reported by the attached transport, if any.
    pub fn session_id(&self) -> Option<String> {
        self.transport().and_then(|t| t.session_id())
    }

    /// Attach and start a transport, ending in the `Ready` state. Roles that
    /// run a handshake use [`Protocol::attach`] + [`Protocol::set_ready`]
    /// instead.
    pub async fn connect(&self, transport: Arc<dyn Transport>) -> McpResult<()> {
        self.attach(transport).await?;
        self.set_ready();
        Ok(())
    }

    /// Attach and start a transport, leaving the connection in the
    /// `Initializing` state for the caller to complete a handshake.
    pub async fn attach(&self, transport: Arc<dyn Transport>) -> McpResult<()> {
        *self.inner.state.lock() = ConnectionState::Connecting;
        if let Err(err) = transport.start().await {
            *self.inner.state.lock() = ConnectionState::Closed;
            return Err(McpError::Transport(err.to_string()));
        }
        *self.inner.transport.write() = Some(transport.clone());
        let handle = self.spawn_read_loop(transport);
        *self.inner.read_task.lock() = Some(handle);
        *self.inner.state.lock() = ConnectionState::Initializing;
        Ok(())
    }

    /// Mark the connection ready after a completed handshake.
    pub fn set_ready(&self) {
        *self.inner.state.lock() = ConnectionState::Ready;
    }

    /// Register a callback invoked exactly once when the connection closes,
    /// whether locally or because the transport ended.
    pub fn on_close(&self, callback: impl FnOnce() + Send + 'static) {
        *self.inner.on_close.lock() = Some(Box::new(callback));
    }

    /// Register a callback for non-fatal engine errors.
    pub fn on_error(&self, callback: impl Fn(McpError) + Send + Sync + 'static) {
        *self.inner.on_error.lock() = Some(Box::new(callback));
    }

    /// Close the connection: reject every outstanding request, close the
    /// transport, and fire the close callback.
    pub async fn close(&self) {
        self.teardown().await;
        let handle = self.inner.read_task.lock().take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Send a typed request and await its correlated result.
    pub async fn request<R: Request>(
        &self,
        request: &R,
        options: RequestOptions,
    ) -> McpResult<R::Result> {
        let transport = self.transport().ok_or(McpError::ConnectionClosed)?;
        let id_number = self.inner.next_request_id.fetch_add(1, Ordering::SeqCst);
        let id = RequestId::Number(id_number);

        let mut params_value = serde_json::to_value(request)?;
        if options.on_progress.is_some() {
            insert_meta(&mut params_value, META_PROGRESS_TOKEN, Value::from(id_number));
        }
        if let Some(related) = &options.related_request_id {
            insert_meta(
                &mut params_value,
                META_RELATED_REQUEST_ID,
                serde_json::to_value(related)?,
            );
        }

        let deadline = Arc::new(DeadlineState::new(
            options.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            options.max_total_timeout,
            options.reset_timeout_on_progress,
        ));
        let (resolver, mut receiver) = oneshot::channel();
        // Register before sending so an immediate response cannot be lost.
        self.inner.pending.lock().insert(
            id_number,
            PendingEntry {
                method: R::METHOD,
                resolver,
                progress: options.on_progress.clone(),
                deadline: deadline.clone(),
            },
        );

        let frame = JsonRpcMessage::Request(JsonRpcRequest::new(
            id.clone(),
            R::METHOD,
            normalize_params(params_value),
        ));
        if let Err(err) = transport.send(frame).await {
            self.inner.pending.lock().remove(&id_number);
            return Err(McpError::Transport(err.to_string()));
        }

        let signal = options.signal.clone();
        loop {
            let sleep = tokio::time::sleep_until(deadline.current().into());
            tokio::select! {
                outcome = &mut receiver => {
                    return match outcome {
                        Ok(Ok(value)) => Ok(serde_json::from_value(value)?),
                        Ok(Err(err)) => Err(err),
                        Err(_) => Err(McpError::ConnectionClosed),
                    };
                }
                () = cancelled(signal.as_ref()) => {
                    self.inner.pending.lock().remove(&id_number);
                    let reason = signal
                        .as_ref()
                        .and_then(CancellationSignal::reason)
                        .unwrap_or_else(|| "Request cancelled".to_string());
                    self.send_cancelled(id, reason.clone()).await;
                    return Err(McpError::Cancelled { reason });
                }
                () = sleep => {
                    if deadline.expired() {
                        self.inner.pending.lock().remove(&id_number);
                        self.send_cancelled(id, "Request timed out".to_string()).await;
                        return Err(McpError::RequestTimeout);
                    }
                    // Deadline was pushed out by progress; wait again.
                }
            }
        }
    }

    /// Send a typed notification. Debounce-eligible methods with no params
    /// and no related id coalesce into a single frame per scheduler tick.
    pub async fn notification<N: Notification>(
        &self,
        notification: &N,
        options: NotificationOptions,
    ) -> McpResult<()> {
        let mut params_value = serde_json::to_value(notification)?;
        let empty = params_value.is_null()
            || params_value.as_object().is_some_and(serde_json::Map::is_empty);

        if empty
            && options.related_request_id.is_none()
            && self
                .inner
                .options
                .debounced_notification_methods
                .contains(N::METHOD)
        {
            if self.inner.debounced.lock().insert(N::METHOD) {
                let protocol = self.clone();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    protocol.inner.debounced.lock().remove(N::METHOD);
                    let frame = JsonRpcMessage::Notification(JsonRpcNotification::new(
                        N::METHOD, None,
                    ));
                    if let Some(transport) = protocol.transport()
                        && let Err(err) = transport.send(frame).await
                    {
                        debug!(method = N::METHOD, "debounced notification send failed: {err}");
                    }
                });
            }
            return Ok(());
        }

        if let Some(related) = &options.related_request_id {
            insert_meta(
                &mut params_value,
                META_RELATED_REQUEST_ID,
                serde_json::to_value(related)?,
            );
        }
        let params = if empty && options.related_request_id.is_none() {
            None
        } else {
            Some(params_value)
        };
        let transport = self.transport().ok_or(McpError::ConnectionClosed)?;
        transport
            .send(JsonRpcMessage::Notification(JsonRpcNotification::new(
                N::METHOD, params,
            )))
            .await
            .map_err(|err| McpError::Transport(err.to_string()))
    }

    /// Register a typed request handler, keyed by the request's method
    /// literal. Replaces any previous handler for the method.
    pub fn set_request_handler<R, F, Fut>(&self, handler: F)
    where
        R: Request,
        F: Fn(R, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<R::Result>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: RequestHandlerFn = Arc::new(move |params, ctx| {
            let handler = handler.clone();
            Box::pin(async move {
                let params = params.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
                let parsed: R = serde_json::from_value(params)
                    .map_err(|err| McpError::InvalidParams(format!("Invalid params: {err}")))?;
                let result = handler(parsed, ctx).await?;
                Ok(serde_json::to_value(result)?)
            })
        });
        self.inner
            .request_handlers
            .write()
            .insert(R::METHOD.to_string(), erased);
    }

    /// Remove the handler for a method.
    pub fn remove_request_handler(&self, method: &str) {
        self.inner.request_handlers.write().remove(method);
    }

    /// Register a typed notification handler. Handler errors are logged and
    /// swallowed.
    pub fn set_notification_handler<N, F, Fut>(&self, handler: F)
    where
        N: Notification,
        F: Fn(N) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<()>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: NotificationHandlerFn = Arc::new(move |params| {
            let handler = handler.clone();
            Box::pin(async move {
                let params = params.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
                let parsed: N = serde_json::from_value(params)
                    .map_err(|err| McpError::InvalidParams(format!("Invalid params: {err}")))?;
                handler(parsed).await
            })
        });
        self.inner
            .notification_handlers
            .write()
            .insert(N::METHOD.to_string(), erased);
    }

    fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.inner.transport.read().clone()
    }

    fn spawn_read_loop(&self, transport: Arc<dyn Transport>) -> JoinHandle<()> {
        let protocol = self.clone();
        tokio::spawn(async move {
            loop {
                match transport.receive().await {
                    Ok(Some(message)) => protocol.handle_message(message).await,
                    Ok(None) => {
                        protocol.teardown().await;
                        break;
                    }
                    Err(err) => {
                        protocol.emit_error(McpError::Transport(err.to_string()));
                        protocol.teardown().await;
                        break;
                    }
                }
            }
        })
    }

    async fn handle_message(&self, message: JsonRpcMessage) {
        match message {
            JsonRpcMessage::Request(request) => self.handle_request(request).await,
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification).await;
            }
            JsonRpcMessage::Response(response) => {
                self.resolve_pending(response.id, Ok(response.result));
            }
            JsonRpcMessage::Error(frame) => match frame.id {
                Some(id) => self.resolve_pending(id, Err(McpError::from_json_rpc(frame.error))),
                None => self.emit_error(McpError::from_json_rpc(frame.error)),
            },
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) {
        let handler = self
            .inner
            .request_handlers
            .read()
            .get(&request.method)
            .cloned();
        let Some(handler) = handler else {
            debug!(method = %request.method, "no handler registered");
            let error = McpError::MethodNotFound(request.method.clone());
            self.send_frame(JsonRpcMessage::Error(JsonRpcErrorFrame::new(
                request.id,
                error.to_json_rpc(),
            )))
            .await;
            return;
        };

        let signal = CancellationSignal::new();
        self.inner
            .in_flight
            .lock()
            .insert(request.id.clone(), signal.clone());

        let progress_token = get_meta(request.params.as_ref(), META_PROGRESS_TOKEN)
            .and_then(|v| serde_json::from_value::<ProgressToken>(v.clone()).ok());
        let ctx = RequestContext::new(
            request.id.clone(),
            self.session_id(),
            signal.clone(),
            progress_token,
            self.clone(),
        );

        let protocol = self.clone();
        tokio::spawn(async move {
            let outcome = handler(request.params, ctx).await;
            protocol.inner.in_flight.lock().remove(&request.id);
            if signal.is_cancelled() {
                debug!(id = %request.id, "result suppressed for cancelled request");
                return;
            }
            let frame = match outcome {
                Ok(value) => JsonRpcMessage::Response(JsonRpcResponse::new(request.id, value)),
                Err(err) => JsonRpcMessage::Error(JsonRpcErrorFrame::new(
                    request.id,
                    err.to_json_rpc(),
                )),
            };
            protocol.send_frame(frame).await;
        });
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        let JsonRpcNotification { method, params, .. } = notification;
        match method.as_str() {
            methods::CANCELLED => {
                let Some(parsed) =
                    params.and_then(|p| serde_json::from_value::<CancelledNotification>(p).ok())
                else {
                    return;
                };
                let signal = self.inner.in_flight.lock().get(&parsed.request_id).cloned();
                if let Some(signal) = signal {
                    signal.cancel(
                        parsed
                            .reason
                            .unwrap_or_else(|| "Request cancelled by peer".to_string()),
                    );
                }
                // Unknown or already-completed ids are a no-op.
            }
            methods::PROGRESS => {
                let Some(parsed) =
                    params.and_then(|p| serde_json::from_value::<ProgressNotification>(p).ok())
                else {
                    return;
                };
                let ProgressToken::Number(token) = parsed.progress_token else {
                    debug!("progress notification with foreign token dropped");
                    return;
                };
                let matched = {
                    let pending = self.inner.pending.lock();
                    pending
                        .get(&token)
                        .map(|entry| (entry.progress.clone(), entry.deadline.clone()))
                };
                match matched {
                    Some((callback, deadline)) => {
                        deadline.reset();
                        if let Some(callback) = callback {
                            callback(parsed.progress);
                        }
                    }
                    None => debug!(token, "progress notification with no pending request"),
                }
            }
            other => {
                let handler = self.inner.notification_handlers.read().get(other).cloned();
                let Some(handler) = handler else {
                    debug!(method = other, "unhandled notification dropped");
                    return;
                };
                let method = method.clone();
                tokio::spawn(async move {
                    if let Err(err) = handler(params).await {
                        warn!(method = %method, "notification handler failed: {err}");
                    }
                });
            }
        }
    }

    fn resolve_pending(&self, id: RequestId, outcome: Result<Value, McpError>) {
        let number = match &id {
            RequestId::Number(number) => *number,
            RequestId::String(_) => {
                warn!(id = %id, "response with foreign id dropped");
                return;
            }
        };
        let entry = self.inner.pending.lock().remove(&number);
        match entry {
            Some(entry) => {
                // Receiver may already be gone after cancellation or timeout.
                let _ = entry.resolver.send(outcome);
            }
            None => debug!(id = number, "late response dropped"),
        }
    }

    async fn send_cancelled(&self, request_id: RequestId, reason: String) {
        let cancelled = CancelledNotification {
            request_id,
            reason: Some(reason),
        };
        if let Err(err) = self
            .notification(&cancelled, NotificationOptions::default())
            .await
        {
            debug!("failed to send cancellation notification: {err}");
        }
    }

    async fn send_frame(&self, frame: JsonRpcMessage) {
        if let Some(transport) = self.transport()
            && let Err(err) = transport.send(frame).await
        {
            warn!("failed to send frame: {err}");
        }
    }

    fn emit_error(&self, error: McpError) {
        let callback = self.inner.on_error.lock();
        match callback.as_ref() {
            Some(callback) => callback(error),
            None => warn!("engine error: {error}"),
        }
    }

    async fn teardown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.inner.state.lock() = ConnectionState::Closing;
        let pending: Vec<PendingEntry> = {
            let mut table = self.inner.pending.lock();
            table.drain().map(|(_, entry)| entry).collect()
        };
        for entry in pending {
            debug!(method = entry.method, "rejecting outstanding request on close");
            let _ = entry.resolver.send(Err(McpError::ConnectionClosed));
        }
        let transport = self.inner.transport.write().take();
        if let Some(transport) = transport {
            transport.close().await;
        }
        *self.inner.state.lock() = ConnectionState::Closed;
        let callback = self.inner.on_close.lock().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Await an optional cancellation signal; pends forever when absent.
async fn cancelled(signal: Option<&CancellationSignal>) {
    match signal {
        Some(signal) => signal.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Null and empty-object params are omitted from the wire frame.
fn normalize_params(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other),
    }
}
