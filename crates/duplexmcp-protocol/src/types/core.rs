//! Core protocol types shared across every MCP feature.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// JSON-RPC request identifier: a string or an integer, unique per originator
/// for the lifetime of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer identifier. The SDK generates these.
    Number(i64),
    /// String identifier, accepted from peers that use them.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// Progress token correlating inbound progress notifications with a request.
/// The engine issues the originating request's integer id as the token.
pub type ProgressToken = RequestId;

/// Opaque pagination cursor.
pub type Cursor = String;

/// Free-form `_meta` mapping reserved for cross-cutting metadata.
pub type Meta = Map<String, Value>;

/// `_meta` key carrying the progress token on outgoing requests.
pub const META_PROGRESS_TOKEN: &str = "progressToken";

/// `_meta` key correlating a notification with the request it relates to.
pub const META_RELATED_REQUEST_ID: &str = "relatedRequestId";

/// Implementation information exchanged during initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    /// Implementation name.
    pub name: String,
    /// Human-readable display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Implementation version.
    pub version: String,
}

impl Implementation {
    /// Create implementation info from a name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            version: version.into(),
        }
    }
}

/// Message role in prompts and sampling exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Content attributed to the user.
    User,
    /// Content attributed to the assistant.
    Assistant,
}

/// Result type for requests that return no data (`ping` and friends).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyResult {}

/// Insert a `_meta` entry into a params value, creating the surrounding
/// objects as needed. A null params value becomes an object.
pub fn insert_meta(params: &mut Value, key: &str, value: Value) {
    if !params.is_object() {
        *params = Value::Object(Map::new());
    }
    let object = params.as_object_mut().expect("params is an object");
    let meta = object
        .entry("_meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if !meta.is_object() {
        *meta = Value::Object(Map::new());
    }
    meta.as_object_mut()
        .expect("_meta is an object")
        .insert(key.to_string(), value);
}

/// Read a `_meta` entry out of a params value, if present.
pub fn get_meta<'a>(params: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    params?.get("_meta")?.get(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_serde() {
        assert_eq!(serde_json::to_value(RequestId::Number(3)).unwrap(), json!(3));
        assert_eq!(
            serde_json::to_value(RequestId::String("x".into())).unwrap(),
            json!("x")
        );
    }

    #[test]
    fn test_insert_meta_creates_objects() {
        let mut params = Value::Null;
        insert_meta(&mut params, META_PROGRESS_TOKEN, json!(5));
        assert_eq!(params, json!({"_meta": {"progressToken": 5}}));

        insert_meta(&mut params, META_RELATED_REQUEST_ID, json!(9));
        assert_eq!(
            params,
            json!({"_meta": {"progressToken": 5, "relatedRequestId": 9}})
        );
    }

    #[test]
    fn test_get_meta() {
        let params = json!({"_meta": {"progressToken": 5}, "other": 1});
        assert_eq!(
            get_meta(Some(&params), META_PROGRESS_TOKEN),
            Some(&json!(5))
        );
        assert_eq!(get_meta(Some(&params), META_RELATED_REQUEST_ID), None);
        assert_eq!(get_meta(None, META_PROGRESS_TOKEN), None);
    }
}
