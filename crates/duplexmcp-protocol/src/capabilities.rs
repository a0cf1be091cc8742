//! Capability gate: per-method assertions that a peer declared the
//! capability a method requires.
//!
//! Violations raise locally, before any frame is sent. Requests are checked
//! against the counterparty's declared capabilities; notifications and
//! handler registrations are checked against the caller's own.

use crate::error::{McpError, McpResult};
use crate::methods;
use crate::types::{ClientCapabilities, ServerCapabilities};

fn server_missing(capability: &str, method: &str) -> McpError {
    McpError::Capability(format!(
        "Server does not support {capability} (required for {method})"
    ))
}

fn client_missing(capability: &str, method: &str) -> McpError {
    McpError::Capability(format!(
        "Client does not support {capability} (required for {method})"
    ))
}

/// Assert that a server declared the capability required by `method`.
///
/// The client runs this against cached peer capabilities before sending a
/// request; the server runs it against its own declaration before installing
/// a handler in strict mode. `caps` of `None` means nothing was declared.
pub fn assert_server_capability(
    caps: Option<&ServerCapabilities>,
    method: &str,
) -> McpResult<()> {
    let declared = |probe: fn(&ServerCapabilities) -> bool| caps.is_some_and(probe);
    match method {
        methods::SET_LOGGING_LEVEL => {
            if !declared(|c| c.logging.is_some()) {
                return Err(server_missing("logging", method));
            }
        }
        methods::LIST_PROMPTS | methods::GET_PROMPT => {
            if !declared(|c| c.prompts.is_some()) {
                return Err(server_missing("prompts", method));
            }
        }
        methods::LIST_RESOURCES
        | methods::LIST_RESOURCE_TEMPLATES
        | methods::READ_RESOURCE => {
            if !declared(|c| c.resources.is_some()) {
                return Err(server_missing("resources", method));
            }
        }
        methods::SUBSCRIBE_RESOURCE | methods::UNSUBSCRIBE_RESOURCE => {
            if !declared(|c| c.resources.is_some()) {
                return Err(server_missing("resources", method));
            }
            if !declared(|c| {
                c.resources
                    .as_ref()
                    .is_some_and(|r| r.subscribe.unwrap_or(false))
            }) {
                return Err(server_missing("resource subscription", method));
            }
        }
        methods::LIST_TOOLS | methods::CALL_TOOL => {
            if !declared(|c| c.tools.is_some()) {
                return Err(server_missing("tools", method));
            }
        }
        methods::COMPLETE => {
            if !declared(|c| c.completions.is_some()) {
                return Err(server_missing("completions", method));
            }
        }
        // ping and initialize are always allowed
        _ => {}
    }
    Ok(())
}

/// Assert that a client declared the capability required by `method`.
///
/// The server runs this against cached peer capabilities before sending a
/// request; the client runs it against its own declaration before installing
/// a handler in strict mode. Elicitation mode sub-bits are checked separately
/// by the elicitation paths, which know the requested mode.
pub fn assert_client_capability(
    caps: Option<&ClientCapabilities>,
    method: &str,
) -> McpResult<()> {
    let declared = |probe: fn(&ClientCapabilities) -> bool| caps.is_some_and(probe);
    match method {
        methods::CREATE_MESSAGE => {
            if !declared(|c| c.sampling.is_some()) {
                return Err(client_missing("sampling", method));
            }
        }
        methods::ELICIT => {
            if !declared(|c| c.elicitation.is_some()) {
                return Err(client_missing("elicitation", method));
            }
        }
        methods::LIST_ROOTS => {
            if !declared(|c| c.roots.is_some()) {
                return Err(client_missing("roots", method));
            }
        }
        // ping is always allowed
        _ => {}
    }
    Ok(())
}

/// Assert that a client may send `method` given its own declared
/// capabilities.
pub fn assert_client_notification_capability(
    caps: &ClientCapabilities,
    method: &str,
) -> McpResult<()> {
    match method {
        methods::ROOTS_LIST_CHANGED => {
            let declared = caps
                .roots
                .as_ref()
                .is_some_and(|r| r.list_changed.unwrap_or(false));
            if !declared {
                return Err(client_missing("roots list changed notifications", method));
            }
        }
        // initialized, cancelled, and progress are always allowed
        _ => {}
    }
    Ok(())
}

/// Assert that a server may send `method` given its own declared
/// capabilities.
pub fn assert_server_notification_capability(
    caps: &ServerCapabilities,
    method: &str,
) -> McpResult<()> {
    match method {
        methods::LOGGING_MESSAGE => {
            if caps.logging.is_none() {
                return Err(server_missing("logging", method));
            }
        }
        methods::RESOURCE_UPDATED | methods::RESOURCE_LIST_CHANGED => {
            if caps.resources.is_none() {
                return Err(server_missing("resources", method));
            }
        }
        methods::TOOL_LIST_CHANGED => {
            if caps.tools.is_none() {
                return Err(server_missing("tools", method));
            }
        }
        methods::PROMPT_LIST_CHANGED => {
            if caps.prompts.is_none() {
                return Err(server_missing("prompts", method));
            }
        }
        // cancelled, progress, and elicitation completion are always allowed
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ElicitationCapability, PromptsCapability, ResourcesCapability, RootsCapability,
        ToolsCapability,
    };

    #[test]
    fn test_tools_gate_message() {
        let caps = ServerCapabilities {
            prompts: Some(PromptsCapability::default()),
            resources: Some(ResourcesCapability::default()),
            ..Default::default()
        };
        let err = assert_server_capability(Some(&caps), methods::LIST_TOOLS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Server does not support tools (required for tools/list)"
        );
    }

    #[test]
    fn test_subscribe_requires_sub_bit() {
        let without_bit = ServerCapabilities {
            resources: Some(ResourcesCapability::default()),
            ..Default::default()
        };
        assert!(
            assert_server_capability(Some(&without_bit), methods::SUBSCRIBE_RESOURCE).is_err()
        );

        let with_bit = ServerCapabilities {
            resources: Some(ResourcesCapability {
                subscribe: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(assert_server_capability(Some(&with_bit), methods::SUBSCRIBE_RESOURCE).is_ok());
    }

    #[test]
    fn test_ping_always_allowed() {
        assert!(assert_server_capability(None, methods::PING).is_ok());
        assert!(assert_client_capability(None, methods::PING).is_ok());
    }

    #[test]
    fn test_sampling_gate() {
        assert!(assert_client_capability(None, methods::CREATE_MESSAGE).is_err());
        let caps = ClientCapabilities {
            sampling: Some(Default::default()),
            ..Default::default()
        };
        assert!(assert_client_capability(Some(&caps), methods::CREATE_MESSAGE).is_ok());
    }

    #[test]
    fn test_elicitation_gate_checks_presence_only() {
        let caps = ClientCapabilities {
            elicitation: Some(ElicitationCapability::default()),
            ..Default::default()
        };
        assert!(assert_client_capability(Some(&caps), methods::ELICIT).is_ok());
    }

    #[test]
    fn test_roots_list_changed_requires_sub_bit() {
        let without_bit = ClientCapabilities {
            roots: Some(RootsCapability::default()),
            ..Default::default()
        };
        assert!(
            assert_client_notification_capability(&without_bit, methods::ROOTS_LIST_CHANGED)
                .is_err()
        );

        let with_bit = ClientCapabilities {
            roots: Some(RootsCapability {
                list_changed: Some(true),
            }),
            ..Default::default()
        };
        assert!(
            assert_client_notification_capability(&with_bit, methods::ROOTS_LIST_CHANGED).is_ok()
        );
    }

    #[test]
    fn test_server_notification_gates() {
        let caps = ServerCapabilities {
            tools: Some(ToolsCapability::default()),
            ..Default::default()
        };
        assert!(
            assert_server_notification_capability(&caps, methods::TOOL_LIST_CHANGED).is_ok()
        );
        assert!(
            assert_server_notification_capability(&caps, methods::LOGGING_MESSAGE).is_err()
        );
    }
}
