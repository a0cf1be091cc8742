//! In-memory duplex transport pair.
//!
//! Frames pass directly as objects over unbounded channels, preserving send
//! order. Closing either end terminates both directions.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use duplexmcp_protocol::JsonRpcMessage;

use crate::error::{TransportError, TransportResult};
use crate::traits::Transport;

/// One end of an in-memory duplex channel.
pub struct InMemoryTransport {
    outgoing: Mutex<Option<mpsc::UnboundedSender<JsonRpcMessage>>>,
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<JsonRpcMessage>>,
    closed: CancellationToken,
    session_id: Option<String>,
    protocol_version: Mutex<Option<String>>,
}

impl InMemoryTransport {
    /// Create a connected pair of transports.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_session_ids(None, None)
    }

    /// Create a connected pair with per-end session ids, for exercising the
    /// reconnect path.
    pub fn pair_with_session_ids(
        left_session: Option<String>,
        right_session: Option<String>,
    ) -> (Self, Self) {
        let (left_tx, right_rx) = mpsc::unbounded_channel();
        let (right_tx, left_rx) = mpsc::unbounded_channel();
        let closed = CancellationToken::new();
        let left = Self {
            outgoing: Mutex::new(Some(left_tx)),
            incoming: tokio::sync::Mutex::new(left_rx),
            closed: closed.clone(),
            session_id: left_session,
            protocol_version: Mutex::new(None),
        };
        let right = Self {
            outgoing: Mutex::new(Some(right_tx)),
            incoming: tokio::sync::Mutex::new(right_rx),
            closed,
            session_id: right_session,
            protocol_version: Mutex::new(None),
        };
        (left, right)
    }

    /// The protocol version hinted after the handshake, if any.
    pub fn protocol_version(&self) -> Option<String> {
        self.protocol_version.lock().clone()
    }
}

impl fmt::Debug for InMemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryTransport")
            .field("session_id", &self.session_id)
            .field("closed", &self.closed.is_cancelled())
            .finish()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn start(&self) -> TransportResult<()> {
        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> TransportResult<()> {
        let guard = self.outgoing.lock();
        let sender = guard.as_ref().ok_or(TransportError::Closed)?;
        sender.send(message).map_err(|_| TransportError::Closed)
    }

    async fn receive(&self) -> TransportResult<Option<JsonRpcMessage>> {
        let mut incoming = self.incoming.lock().await;
        // Drain queued frames before reporting the channel closed.
        tokio::select! {
            biased;
            message = incoming.recv() => Ok(message),
            () = self.closed.cancelled() => Ok(None),
        }
    }

    async fn close(&self) {
        self.closed.cancel();
        self.outgoing.lock().take();
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.clone()
    }

    fn set_protocol_version(&self, version: &str) {
        *self.protocol_version.lock() = Some(version.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duplexmcp_protocol::{JsonRpcNotification, RequestId};

    fn notification(method: &str) -> JsonRpcMessage {
        JsonRpcMessage::Notification(JsonRpcNotification::new(method, None))
    }

    #[tokio::test]
    async fn test_frames_cross_in_order() {
        let (left, right) = InMemoryTransport::pair();
        left.send(notification("first")).await.unwrap();
        left.send(notification("second")).await.unwrap();

        let first = right.receive().await.unwrap().unwrap();
        let second = right.receive().await.unwrap().unwrap();
        assert_eq!(first.method(), Some("first"));
        assert_eq!(second.method(), Some("second"));
    }

    #[tokio::test]
    async fn test_close_ends_both_directions() {
        let (left, right) = InMemoryTransport::pair();
        left.close().await;
        assert!(matches!(
            left.send(notification("late")).await,
            Err(TransportError::Closed)
        ));
        assert!(right.receive().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_request_ids_survive_the_channel() {
        let (left, right) = InMemoryTransport::pair();
        let frame = JsonRpcMessage::Request(duplexmcp_protocol::JsonRpcRequest::new(
            RequestId::Number(7),
            "ping",
            None,
        ));
        left.send(frame).await.unwrap();
        match right.receive().await.unwrap().unwrap() {
            JsonRpcMessage::Request(request) => assert_eq!(request.id, RequestId::Number(7)),
            other => panic!("expected request, got {other}"),
        }
    }
}
