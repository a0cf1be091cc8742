//! The core transport trait.

use async_trait::async_trait;
use std::fmt;

use duplexmcp_protocol::JsonRpcMessage;

use crate::error::TransportResult;

/// A lossless, ordered, duplex channel for JSON-RPC frames.
///
/// Ordering from a given sender must be preserved. Framing is the transport's
/// concern (newline-delimited for stdio, chunked events for HTTP, direct
/// object passing in memory); the engine only sees whole frames.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Open the underlying channel. Idempotent.
    async fn start(&self) -> TransportResult<()>;

    /// Deliver a single frame to the peer.
    async fn send(&self, message: JsonRpcMessage) -> TransportResult<()>;

    /// Receive the next frame. `Ok(None)` means the channel ended.
    async fn receive(&self) -> TransportResult<Option<JsonRpcMessage>>;

    /// Terminate the channel. Must not fail; closing a closed transport is a
    /// no-op.
    async fn close(&self);

    /// Marker identifying a pre-existing conversation. When set at connect
    /// time, the engine skips re-initialization.
    fn session_id(&self) -> Option<String> {
        None
    }

    /// Post-handshake hint for transports that carry the negotiated version
    /// out of band (for example in an HTTP header).
    fn set_protocol_version(&self, _version: &str) {}
}
