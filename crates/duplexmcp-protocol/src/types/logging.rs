//! Logging severity and the logging message notification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::core::EmptyResult;
use super::{Notification, Request};
use crate::methods;

/// RFC 5424 logging severities, least severe first. The derived ordering is
/// the severity ordering the server's level filter relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    /// Detailed debugging information.
    Debug,
    /// Informational messages.
    Info,
    /// Normal but significant events.
    Notice,
    /// Warning conditions.
    Warning,
    /// Error conditions.
    Error,
    /// Critical conditions.
    Critical,
    /// Action must be taken immediately.
    Alert,
    /// System is unusable.
    Emergency,
}

/// `logging/setLevel` request params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetLevelRequest {
    /// Minimum severity the client wants to receive.
    pub level: LoggingLevel,
}

impl Request for SetLevelRequest {
    const METHOD: &'static str = methods::SET_LOGGING_LEVEL;
    type Result = EmptyResult;
}

/// `notifications/message` params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingMessageNotification {
    /// Severity of this message.
    pub level: LoggingLevel,
    /// Optional logger name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    /// Arbitrary JSON payload.
    pub data: Value,
}

impl Notification for LoggingMessageNotification {
    const METHOD: &'static str = methods::LOGGING_MESSAGE;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(LoggingLevel::Debug < LoggingLevel::Info);
        assert!(LoggingLevel::Info < LoggingLevel::Warning);
        assert!(LoggingLevel::Warning < LoggingLevel::Emergency);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(LoggingLevel::Warning).unwrap(),
            serde_json::json!("warning")
        );
    }
}
