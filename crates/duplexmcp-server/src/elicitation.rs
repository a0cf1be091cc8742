//! Server-initiated elicitation.
//!
//! Form mode sends `elicitation/create`, awaits the user's response, and
//! validates accepted content against the requested schema. Url mode points
//! the user at an external page; the final outcome is delivered later through
//! an [`ElicitationCompletionNotifier`].

use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use duplexmcp_core::{NotificationOptions, RequestOptions};
use duplexmcp_protocol::types::{
    ElicitRequest, ElicitResult, ElicitationAction, ElicitationCompleteNotification,
    ElicitationMode, RequestId,
};
use duplexmcp_protocol::{McpError, McpResult};

use crate::Server;

/// A url-mode elicitation awaiting its out-of-band completion.
#[derive(Debug, Clone)]
pub struct ElicitationRecord {
    /// Identifier correlating the eventual completion notification.
    pub elicitation_id: String,
    /// Mode the elicitation was issued with.
    pub mode: ElicitationMode,
    /// Inbound request this elicitation was issued on behalf of, if any.
    pub related_request_id: Option<RequestId>,
}

impl Server {
    /// Ask the client to elicit input from the user.
    ///
    /// An omitted mode means form. The client must have declared the matching
    /// elicitation mode. Accepted form content is validated against
    /// `requested_schema` with the configured validator; decline and cancel
    /// responses pass through unvalidated.
    pub async fn elicit_input(
        &self,
        params: ElicitRequest,
        options: RequestOptions,
    ) -> McpResult<ElicitResult> {
        let mode = params.mode.unwrap_or(ElicitationMode::Form);
        let elicitation = self
            .inner
            .client_capabilities
            .read()
            .as_ref()
            .and_then(|caps| caps.elicitation.clone());
        let supported = match mode {
            ElicitationMode::Form => elicitation.as_ref().is_some_and(|e| e.form.is_some()),
            ElicitationMode::Url => elicitation.as_ref().is_some_and(|e| e.url.is_some()),
        };
        if !supported {
            return Err(McpError::Capability(format!(
                "Client does not support {mode} elicitation."
            )));
        }

        match mode {
            ElicitationMode::Form => self.elicit_form(params, options).await,
            ElicitationMode::Url => self.elicit_url(params, options).await,
        }
    }

    async fn elicit_form(
        &self,
        mut params: ElicitRequest,
        options: RequestOptions,
    ) -> McpResult<ElicitResult> {
        params.mode = Some(ElicitationMode::Form);
        let requested_schema = params.requested_schema.clone();

        let result: ElicitResult = self.protocol.request(&params, options).await?;

        if result.action == ElicitationAction::Accept
            && let Some(schema) = &requested_schema
        {
            let validator = self.inner.validator.get_validator(schema).map_err(|err| {
                McpError::Internal(format!("Error validating elicitation response: {err}"))
            })?;
            let content = Value::Object(result.content.clone().unwrap_or_default());
            validator.validate(&content).map_err(|message| {
                McpError::InvalidParams(format!(
                    "Elicitation response content does not match requested schema: {message}"
                ))
            })?;
        }
        Ok(result)
    }

    async fn elicit_url(
        &self,
        mut params: ElicitRequest,
        options: RequestOptions,
    ) -> McpResult<ElicitResult> {
        if params.url.is_none() {
            return Err(McpError::InvalidParams(
                "URL mode elicitation requires a url".to_string(),
            ));
        }
        let elicitation_id = params
            .elicitation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        params.mode = Some(ElicitationMode::Url);
        params.elicitation_id = Some(elicitation_id.clone());

        self.inner.pending_elicitations.insert(
            elicitation_id.clone(),
            ElicitationRecord {
                elicitation_id,
                mode: ElicitationMode::Url,
                related_request_id: options.related_request_id.clone(),
            },
        );
        // The response only says whether the user opened the URL; content
        // arrives later through the completion notifier.
        self.protocol.request(&params, options).await
    }

    /// Url-mode elicitations still awaiting completion.
    pub fn pending_elicitations(&self) -> Vec<ElicitationRecord> {
        self.inner
            .pending_elicitations
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Build a notifier that finishes a url-mode elicitation out of band by
    /// emitting `notifications/elicitation/complete`.
    ///
    /// # Errors
    ///
    /// Fails when the client did not declare `elicitation.url`.
    pub fn create_elicitation_completion_notifier(
        &self,
        elicitation_id: impl Into<String>,
        related_request_id: Option<RequestId>,
    ) -> McpResult<ElicitationCompletionNotifier> {
        let supported = self
            .inner
            .client_capabilities
            .read()
            .as_ref()
            .and_then(|caps| caps.elicitation.as_ref())
            .is_some_and(|e| e.url.is_some());
        if !supported {
            return Err(McpError::Capability(
                "Client does not support url elicitation.".to_string(),
            ));
        }
        Ok(ElicitationCompletionNotifier {
            server: self.clone(),
            elicitation_id: elicitation_id.into(),
            related_request_id,
        })
    }
}

/// Emits `notifications/elicitation/complete` for one elicitation.
#[derive(Clone)]
pub struct ElicitationCompletionNotifier {
    server: Server,
    elicitation_id: String,
    related_request_id: Option<RequestId>,
}

impl ElicitationCompletionNotifier {
    /// The elicitation this notifier completes.
    pub fn elicitation_id(&self) -> &str {
        &self.elicitation_id
    }

    /// Emit the completion notification and drop the pending record.
    pub async fn notify(&self) -> McpResult<()> {
        self.server
            .protocol()
            .notification(
                &ElicitationCompleteNotification {
                    elicitation_id: self.elicitation_id.clone(),
                },
                NotificationOptions {
                    related_request_id: self.related_request_id.clone(),
                },
            )
            .await?;
        self.server
            .inner
            .pending_elicitations
            .remove(&self.elicitation_id);
        Ok(())
    }
}

impl fmt::Debug for ElicitationCompletionNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElicitationCompletionNotifier")
            .field("elicitation_id", &self.elicitation_id)
            .field("related_request_id", &self.related_request_id)
            .finish()
    }
}
