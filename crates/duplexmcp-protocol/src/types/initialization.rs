//! Connection handshake types.

use serde::{Deserialize, Serialize};

use super::capabilities::{ClientCapabilities, ServerCapabilities};
use super::core::Implementation;
use super::{Notification, Request};
use crate::methods;

/// `initialize` request params. Always the first request from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Latest protocol version the client supports.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Client capabilities.
    pub capabilities: ClientCapabilities,
    /// Client implementation info.
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
}

/// `initialize` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    /// Protocol version the server selected.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
    /// Server implementation info.
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
    /// Usage instructions for the client's model, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Request for InitializeRequest {
    const METHOD: &'static str = methods::INITIALIZE;
    type Result = InitializeResult;
}

/// `notifications/initialized`, sent by the client after a successful
/// `initialize` exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializedNotification {}

impl Notification for InitializedNotification {
    const METHOD: &'static str = methods::INITIALIZED;
}
