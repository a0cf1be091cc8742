//! Filesystem roots the client exposes to servers.

use serde::{Deserialize, Serialize};

use super::{Notification, Request};
use crate::methods;

/// A root directory or file the client grants servers access to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    /// Root URI; must start with `file://` in current protocol revisions.
    pub uri: String,
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `roots/list` request params (none; server to client).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRootsRequest {}

/// `roots/list` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRootsResult {
    /// The roots the client exposes.
    pub roots: Vec<Root>,
}

impl Request for ListRootsRequest {
    const METHOD: &'static str = methods::LIST_ROOTS;
    type Result = ListRootsResult;
}

/// `notifications/roots/list_changed` params (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootsListChangedNotification {}

impl Notification for RootsListChangedNotification {
    const METHOD: &'static str = methods::ROOTS_LIST_CHANGED;
}
