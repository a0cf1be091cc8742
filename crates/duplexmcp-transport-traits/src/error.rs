//! Transport error types.

use thiserror::Error;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Represents errors that can occur during transport operations.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum TransportError {
    /// Failed to establish the underlying channel.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to send a frame.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive a frame.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Failed to serialize or deserialize a frame.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// The channel is closed.
    #[error("Transport closed")]
    Closed,

    /// An underlying I/O error occurred.
    #[error("IO error: {0}")]
    Io(String),
}
