//! Context handed to inbound request handlers.

use std::fmt;

use duplexmcp_protocol::McpResult;
use duplexmcp_protocol::types::{
    Notification, Progress, ProgressNotification, ProgressToken, Request, RequestId,
};

use crate::cancellation::CancellationSignal;
use crate::engine::{NotificationOptions, Protocol, RequestOptions};

/// Per-request context: identity, cancellation, and a handle back to the
/// engine for progress reports and related frames.
#[derive(Clone)]
pub struct RequestContext {
    request_id: RequestId,
    session_id: Option<String>,
    cancellation: CancellationSignal,
    progress_token: Option<ProgressToken>,
    protocol: Protocol,
}

impl RequestContext {
    pub(crate) fn new(
        request_id: RequestId,
        session_id: Option<String>,
        cancellation: CancellationSignal,
        progress_token: Option<ProgressToken>,
        protocol: Protocol,
    ) -> Self {
        Self {
            request_id,
            session_id,
            cancellation,
            progress_token,
            protocol,
        }
    }

    /// Id of the inbound request being serviced.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Transport session id, when the transport carries one.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Cancellation signal for this request. Handlers are expected to observe
    /// it and abort; cancellation is cooperative.
    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancellation
    }

    /// Progress token the caller attached, if any.
    pub fn progress_token(&self) -> Option<&ProgressToken> {
        self.progress_token.as_ref()
    }

    /// Report progress back to the caller. A no-op when the caller attached
    /// no progress token.
    pub async fn report_progress(&self, progress: Progress) -> McpResult<()> {
        let Some(token) = &self.progress_token else {
            return Ok(());
        };
        self.protocol
            .notification(
                &ProgressNotification {
                    progress_token: token.clone(),
                    progress,
                },
                NotificationOptions::default(),
            )
            .await
    }

    /// Send a notification correlated with this request through
    /// `_meta.relatedRequestId`.
    pub async fn send_notification<N: Notification>(&self, notification: &N) -> McpResult<()> {
        self.protocol
            .notification(
                notification,
                NotificationOptions {
                    related_request_id: Some(self.request_id.clone()),
                },
            )
            .await
    }

    /// Send a request correlated with this request through
    /// `_meta.relatedRequestId`.
    pub async fn send_request<R: Request>(
        &self,
        request: &R,
        options: RequestOptions,
    ) -> McpResult<R::Result> {
        let options = RequestOptions {
            related_request_id: Some(self.request_id.clone()),
            ..options
        };
        self.protocol.request(request, options).await
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("session_id", &self.session_id)
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("progress_token", &self.progress_token)
            .finish()
    }
}
