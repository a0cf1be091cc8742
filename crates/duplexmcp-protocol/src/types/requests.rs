//! Ping, cancellation, and progress types used by the engine itself.

use serde::{Deserialize, Serialize};

use super::core::{EmptyResult, ProgressToken, RequestId};
use super::{Notification, Request};
use crate::methods;

/// `ping` request params (none). Either peer may ping the other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PingRequest {}

impl Request for PingRequest {
    const METHOD: &'static str = methods::PING;
    type Result = EmptyResult;
}

/// `notifications/cancelled` params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelledNotification {
    /// Id of the request being cancelled.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    /// Optional human-readable reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Notification for CancelledNotification {
    const METHOD: &'static str = methods::CANCELLED;
}

/// Progress state carried by a progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Progress made so far. Increases monotonically, even when the total is
    /// unknown.
    pub progress: f64,
    /// Total expected, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    /// Optional progress message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `notifications/progress` params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressNotification {
    /// Token correlating this notification with an in-flight request.
    #[serde(rename = "progressToken")]
    pub progress_token: ProgressToken,
    /// Progress state.
    #[serde(flatten)]
    pub progress: Progress,
}

impl Notification for ProgressNotification {
    const METHOD: &'static str = methods::PROGRESS;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_notification_flattens() {
        let notification = ProgressNotification {
            progress_token: ProgressToken::Number(3),
            progress: Progress {
                progress: 0.5,
                total: Some(1.0),
                message: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&notification).unwrap(),
            json!({"progressToken": 3, "progress": 0.5, "total": 1.0})
        );
    }
}
