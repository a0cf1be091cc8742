//! Error types shared across the SDK.
//!
//! Local-state violations (capability checks, registration) fail fast before
//! any I/O; remote peer errors surface as [`McpError::Rpc`]; everything else
//! maps onto a JSON-RPC error code at the wire boundary.

use serde_json::Value;
use thiserror::Error;

use crate::jsonrpc::JsonRpcError;

/// Result type alias for MCP operations.
pub type McpResult<T> = std::result::Result<T, McpError>;

/// JSON-RPC and SDK error codes emitted at the boundary.
pub mod error_codes {
    /// Invalid JSON was received by the peer.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// SDK code: the connection closed before the request resolved.
    pub const CONNECTION_CLOSED: i32 = -32000;
    /// SDK code: the request did not resolve within its timeout.
    pub const REQUEST_TIMEOUT: i32 = -32001;
}

/// Error type used throughout the SDK.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum McpError {
    /// An error returned by the remote peer as a JSON-RPC error frame.
    #[error("{message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i32,
        /// Error message from the peer.
        message: String,
        /// Optional structured error data.
        data: Option<Value>,
    },

    /// Invalid JSON received from the peer.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The request frame itself was malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// No handler is registered for the method.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Parameters failed to parse or validate.
    #[error("{0}")]
    InvalidParams(String),

    /// An internal failure, including handler panics surfaced as errors.
    #[error("{0}")]
    Internal(String),

    /// A capability assertion failed locally, before any frame was sent.
    #[error("{0}")]
    Capability(String),

    /// The request did not resolve within its timeout.
    #[error("Request timed out")]
    RequestTimeout,

    /// The request was cancelled; the message is the supplied reason verbatim.
    #[error("{reason}")]
    Cancelled {
        /// Reason supplied by whoever cancelled the request.
        reason: String,
    },

    /// The connection closed while the request was outstanding.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The underlying transport failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization or deserialization failed locally.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl McpError {
    /// The JSON-RPC error code this error maps to at the wire boundary.
    pub fn code(&self) -> i32 {
        match self {
            Self::Rpc { code, .. } => *code,
            Self::ParseError(_) => error_codes::PARSE_ERROR,
            Self::InvalidRequest(_) | Self::Capability(_) => error_codes::INVALID_REQUEST,
            Self::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            Self::InvalidParams(_) | Self::Serialization(_) => error_codes::INVALID_PARAMS,
            Self::Internal(_) | Self::Transport(_) => error_codes::INTERNAL_ERROR,
            Self::RequestTimeout => error_codes::REQUEST_TIMEOUT,
            Self::Cancelled { .. } | Self::ConnectionClosed => error_codes::CONNECTION_CLOSED,
        }
    }

    /// Convert to a wire-level JSON-RPC error object.
    pub fn to_json_rpc(&self) -> JsonRpcError {
        let data = match self {
            Self::Rpc { data, .. } => data.clone(),
            _ => None,
        };
        JsonRpcError {
            code: self.code(),
            message: self.to_string(),
            data,
        }
    }

    /// Construct from a wire-level JSON-RPC error object received from the peer.
    pub fn from_json_rpc(error: JsonRpcError) -> Self {
        Self::Rpc {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }

    /// Construct a cancellation error carrying the supplied reason verbatim.
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
