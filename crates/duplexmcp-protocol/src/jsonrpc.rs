//! JSON-RPC 2.0 frame types.
//!
//! Four frame kinds travel over a transport: requests, responses, error
//! responses, and notifications. All frames carry `jsonrpc: "2.0"`. An error
//! frame may carry a null id when the peer could not parse the offending
//! request at all.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::types::RequestId;

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC version marker; serializes as the literal `"2.0"` and rejects
/// anything else on input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "Invalid JSON-RPC version: expected '{JSONRPC_VERSION}', got '{version}'"
            )))
        }
    }
}

/// JSON-RPC request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Request identifier, unique per originator for the connection lifetime.
    pub id: RequestId,
    /// Method name.
    pub method: String,
    /// Request parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC success response frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Identifier of the request this responds to.
    pub id: RequestId,
    /// Result payload.
    pub result: Value,
}

/// JSON-RPC error object carried inside an error frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC error response frame. `id` is null when the offending input
/// could not be parsed far enough to recover an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorFrame {
    /// JSON-RPC version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Identifier of the request this responds to, or null for parse errors.
    pub id: Option<RequestId>,
    /// The error object.
    pub error: JsonRpcError,
}

/// JSON-RPC notification frame (no id, no response).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Method name.
    pub method: String,
    /// Notification parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Any JSON-RPC frame. Classification is structural: requests carry an id and
/// a method, notifications a method without an id, responses a result, and
/// error frames an error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Request frame.
    Request(JsonRpcRequest),
    /// Notification frame.
    Notification(JsonRpcNotification),
    /// Success response frame.
    Response(JsonRpcResponse),
    /// Error response frame.
    Error(JsonRpcErrorFrame),
}

impl JsonRpcRequest {
    /// Create a new request frame.
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcResponse {
    /// Create a success response for the given request id.
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            result,
        }
    }
}

impl JsonRpcErrorFrame {
    /// Create an error response for the given request id.
    pub fn new(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: Some(id),
            error,
        }
    }

    /// Create a parse-error frame with a null id.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: None,
            error: JsonRpcError {
                code: crate::error_codes::PARSE_ERROR,
                message: message.into(),
                data: None,
            },
        }
    }
}

impl JsonRpcNotification {
    /// Create a new notification frame.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcMessage {
    /// The method name, for request and notification frames.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) | Self::Error(_) => None,
        }
    }
}

impl fmt::Display for JsonRpcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(r) => write!(f, "request {} (id {})", r.method, r.id),
            Self::Notification(n) => write!(f, "notification {}", n.method),
            Self::Response(r) => write!(f, "response (id {})", r.id),
            Self::Error(e) => write!(f, "error {} ({})", e.error.message, e.error.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_version_round_trip() {
        let json = serde_json::to_string(&JsonRpcVersion).unwrap();
        assert_eq!(json, "\"2.0\"");
        assert!(serde_json::from_str::<JsonRpcVersion>("\"1.0\"").is_err());
    }

    #[test]
    fn test_classification() {
        let request: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).unwrap();
        assert!(matches!(request, JsonRpcMessage::Request(_)));

        let notification: JsonRpcMessage = serde_json::from_value(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .unwrap();
        assert!(matches!(notification, JsonRpcMessage::Notification(_)));

        let response: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": {}})).unwrap();
        assert!(matches!(response, JsonRpcMessage::Response(_)));

        let error: JsonRpcMessage = serde_json::from_value(
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32601, "message": "nope"}}),
        )
        .unwrap();
        assert!(matches!(error, JsonRpcMessage::Error(_)));
    }

    #[test]
    fn test_null_id_error_frame() {
        let frame = JsonRpcErrorFrame::parse_error("bad json");
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], json!(-32700));

        let parsed: JsonRpcMessage = serde_json::from_value(value).unwrap();
        match parsed {
            JsonRpcMessage::Error(e) => assert!(e.id.is_none()),
            other => panic!("expected error frame, got {other}"),
        }
    }

    #[test]
    fn test_string_and_integer_ids() {
        let with_string: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "abc", "method": "ping"}))
                .unwrap();
        assert_eq!(with_string.id, RequestId::String("abc".into()));

        let with_int: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 7, "method": "ping"})).unwrap();
        assert_eq!(with_int.id, RequestId::Number(7));
    }

    #[test]
    fn test_params_omitted_when_absent() {
        let request = JsonRpcRequest::new(RequestId::Number(1), "ping", None);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("params").is_none());
    }
}
