//! Client role integration tests: handshake and version negotiation,
//! tool-output validation, and the elicitation handler wrapper.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Map, json};

use duplexmcp_client::{Client, ClientOptions, ElicitationHandler};
use duplexmcp_core::{ConnectionState, Protocol, ProtocolOptions, RequestOptions};
use duplexmcp_protocol::types::{
    CallToolRequest, CallToolResult, ClientCapabilities, ElicitRequest, ElicitResult,
    ElicitationAction, ElicitationCapability, FormElicitationCapability, Implementation,
    InitializeRequest, InitializeResult, InitializedNotification, ListToolsRequest,
    ListToolsResult, SamplingCapability, ServerCapabilities, Tool, ToolsCapability,
    UrlElicitationCapability,
};
use duplexmcp_protocol::{McpError, error_codes};
use duplexmcp_transport_traits::InMemoryTransport;

/// A raw engine standing in for a server, answering `initialize` with the
/// given capabilities and echoing the requested version unless overridden.
async fn fake_server(
    capabilities: ServerCapabilities,
    force_version: Option<&'static str>,
) -> (Protocol, Arc<InMemoryTransport>) {
    let (client_end, server_end) = InMemoryTransport::pair();
    let server = Protocol::new(ProtocolOptions::default());
    server.set_request_handler(move |request: InitializeRequest, _ctx| {
        let capabilities = capabilities.clone();
        async move {
            Ok(InitializeResult {
                protocol_version: force_version
                    .map(str::to_string)
                    .unwrap_or(request.protocol_version),
                capabilities,
                server_info: Implementation::new("fake-server", "0.0.0"),
                instructions: None,
            })
        }
    });
    server.connect(Arc::new(server_end)).await.unwrap();
    (server, Arc::new(client_end))
}

fn tool_capable() -> ServerCapabilities {
    ServerCapabilities {
        tools: Some(ToolsCapability::default()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_handshake_reaches_ready_and_caches_capabilities() {
    let (server, transport) = fake_server(tool_capable(), None).await;
    let initialized = Arc::new(AtomicBool::new(false));
    let flag = initialized.clone();
    server.set_notification_handler(move |_notification: InitializedNotification| {
        let flag = flag.clone();
        async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        }
    });

    let client = Client::new(ClientOptions::default());
    client.connect(transport).await.unwrap();

    assert_eq!(client.state(), ConnectionState::Ready);
    assert!(client.server_capabilities().unwrap().tools.is_some());
    assert_eq!(client.server_info().unwrap().name, "fake-server");

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(initialized.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_version_downgrade_accepted() {
    let (_server, transport) = fake_server(tool_capable(), Some("2025-06-18")).await;
    let client = Client::new(ClientOptions::default());
    client.connect(transport).await.unwrap();
    assert_eq!(client.state(), ConnectionState::Ready);
    assert_eq!(client.negotiated_version().as_deref(), Some("2025-06-18"));
}

#[tokio::test]
async fn test_unsupported_version_rejected_and_closed() {
    let (_server, transport) = fake_server(tool_capable(), Some("1999-01-01")).await;
    let client = Client::new(ClientOptions::default());
    let err = client.connect(transport).await.unwrap_err();
    assert!(err.to_string().contains("protocol version is not supported"));
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_capability_gate_blocks_unsupported_request() {
    // Server declares no capabilities at all.
    let (_server, transport) = fake_server(ServerCapabilities::default(), None).await;
    let client = Client::new(ClientOptions::default());
    client.connect(transport).await.unwrap();

    let err = client.list_tools(None).await.unwrap_err();
    assert!(matches!(err, McpError::Capability(_)));
    assert_eq!(
        err.to_string(),
        "Server does not support tools (required for tools/list)"
    );
}

fn advertise_tool(server: &Protocol, output_schema: Option<serde_json::Value>) {
    let tool = Tool {
        name: "t".to_string(),
        title: None,
        description: None,
        input_schema: json!({"type": "object"}),
        output_schema,
    };
    server.set_request_handler(move |_request: ListToolsRequest, _ctx| {
        let tool = tool.clone();
        async move {
            Ok(ListToolsResult {
                tools: vec![tool],
                next_cursor: None,
            })
        }
    });
}

#[tokio::test]
async fn test_tool_output_schema_violation_rejected() {
    let (server, transport) = fake_server(tool_capable(), None).await;
    advertise_tool(
        &server,
        Some(json!({
            "type": "object",
            "properties": {"x": {"type": "integer"}},
            "required": ["x"],
        })),
    );
    server.set_request_handler(|_request: CallToolRequest, _ctx| async move {
        Ok(CallToolResult {
            content: vec![],
            structured_content: Some(json!({"x": "not-an-int"})),
            is_error: None,
        })
    });

    let client = Client::new(ClientOptions::default());
    client.connect(transport).await.unwrap();
    let listed = client.list_tools(None).await.unwrap();

    // The cache and the listing agree on the set of tool names.
    assert_eq!(
        client.cached_output_schemas(),
        listed
            .tools
            .iter()
            .map(|t| t.name.clone())
            .collect::<Vec<_>>()
    );

    let err = client
        .call_tool(CallToolRequest::new("t"), RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), error_codes::INVALID_PARAMS);
    assert!(
        err.to_string()
            .contains("Structured content does not match the tool's output schema")
    );
}

#[tokio::test]
async fn test_tool_output_valid_structured_content_passes() {
    let (server, transport) = fake_server(tool_capable(), None).await;
    advertise_tool(
        &server,
        Some(json!({
            "type": "object",
            "properties": {"x": {"type": "integer"}},
            "required": ["x"],
        })),
    );
    server.set_request_handler(|_request: CallToolRequest, _ctx| async move {
        Ok(CallToolResult {
            content: vec![],
            structured_content: Some(json!({"x": 41})),
            is_error: None,
        })
    });

    let client = Client::new(ClientOptions::default());
    client.connect(transport).await.unwrap();
    client.list_tools(None).await.unwrap();

    let result = client
        .call_tool(CallToolRequest::new("t"), RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(result.structured_content, Some(json!({"x": 41})));
}

#[tokio::test]
async fn test_tool_with_schema_must_return_structured_content() {
    let (server, transport) = fake_server(tool_capable(), None).await;
    advertise_tool(&server, Some(json!({"type": "object"})));
    server.set_request_handler(|_request: CallToolRequest, _ctx| async move {
        Ok(CallToolResult::default())
    });

    let client = Client::new(ClientOptions::default());
    client.connect(transport).await.unwrap();
    client.list_tools(None).await.unwrap();

    let err = client
        .call_tool(CallToolRequest::new("t"), RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), error_codes::INVALID_REQUEST);
    assert!(err.to_string().contains("did not return structured content"));
}

#[tokio::test]
async fn test_tool_error_results_skip_validation() {
    let (server, transport) = fake_server(tool_capable(), None).await;
    advertise_tool(
        &server,
        Some(json!({"type": "object", "required": ["x"]})),
    );
    server.set_request_handler(|_request: CallToolRequest, _ctx| async move {
        Ok(CallToolResult {
            content: vec![],
            structured_content: None,
            is_error: Some(true),
        })
    });

    let client = Client::new(ClientOptions::default());
    client.connect(transport).await.unwrap();
    client.list_tools(None).await.unwrap();

    let result = client
        .call_tool(CallToolRequest::new("t"), RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(true));
}

#[tokio::test]
async fn test_tool_without_schema_is_unvalidated() {
    let (server, transport) = fake_server(tool_capable(), None).await;
    advertise_tool(&server, None);
    server.set_request_handler(|_request: CallToolRequest, _ctx| async move {
        Ok(CallToolResult::default())
    });

    let client = Client::new(ClientOptions::default());
    client.connect(transport).await.unwrap();
    client.list_tools(None).await.unwrap();
    assert!(client.cached_output_schemas().is_empty());
    assert!(
        client
            .call_tool(CallToolRequest::new("t"), RequestOptions::default())
            .await
            .is_ok()
    );
}

struct AcceptEmpty;

#[async_trait]
impl ElicitationHandler for AcceptEmpty {
    async fn handle(&self, _request: ElicitRequest) -> duplexmcp_protocol::McpResult<ElicitResult> {
        Ok(ElicitResult::accept(Map::new()))
    }
}

fn form_client(apply_defaults: bool) -> Client {
    Client::new(ClientOptions {
        capabilities: ClientCapabilities {
            elicitation: Some(ElicitationCapability {
                form: Some(FormElicitationCapability {
                    apply_defaults: Some(apply_defaults),
                }),
                url: None,
            }),
            ..Default::default()
        },
        ..Default::default()
    })
}

#[tokio::test]
async fn test_elicitation_defaults_injected_on_accept() {
    let (server, transport) = fake_server(ServerCapabilities::default(), None).await;
    let client = form_client(true);
    client.set_elicitation_handler(Arc::new(AcceptEmpty)).unwrap();
    client.connect(transport).await.unwrap();

    let request = ElicitRequest::form(
        "Fill in the settings",
        json!({
            "type": "object",
            "properties": {
                "verbose": {"type": "boolean", "default": true},
                "name": {"type": "string", "default": "anonymous"},
                "retries": {"type": "integer", "default": 2},
                "level": {"type": "string", "enum": ["low", "high"], "default": "high"},
                "tags": {
                    "type": "array",
                    "items": {"type": "string", "enum": ["a", "b"]},
                    "default": ["b"],
                },
            },
            "required": ["verbose", "name", "retries", "level", "tags"],
        }),
    );
    let result = server
        .request(&request, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(result.action, ElicitationAction::Accept);
    let content = result.content.unwrap();
    assert_eq!(content.get("verbose"), Some(&json!(true)));
    assert_eq!(content.get("name"), Some(&json!("anonymous")));
    assert_eq!(content.get("retries"), Some(&json!(2)));
    assert_eq!(content.get("level"), Some(&json!("high")));
    assert_eq!(content.get("tags"), Some(&json!(["b"])));
}

#[tokio::test]
async fn test_elicitation_defaults_not_injected_without_capability() {
    let (server, transport) = fake_server(ServerCapabilities::default(), None).await;
    let client = form_client(false);
    client.set_elicitation_handler(Arc::new(AcceptEmpty)).unwrap();
    client.connect(transport).await.unwrap();

    let request = ElicitRequest::form(
        "Fill in the settings",
        json!({
            "type": "object",
            "properties": {"name": {"type": "string", "default": "anonymous"}},
        }),
    );
    let result = server
        .request(&request, RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(result.content, Some(Map::new()));
}

#[tokio::test]
async fn test_elicitation_undeclared_url_mode_refused() {
    let (server, transport) = fake_server(ServerCapabilities::default(), None).await;
    let client = form_client(false);
    client.set_elicitation_handler(Arc::new(AcceptEmpty)).unwrap();
    client.connect(transport).await.unwrap();

    let request = ElicitRequest::url("Visit this page", "https://example.com/auth", "e-1");
    let err = server
        .request(&request, RequestOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not support url elicitation"));
}

#[tokio::test]
async fn test_elicitation_url_mode_allowed_when_declared() {
    let (server, transport) = fake_server(ServerCapabilities::default(), None).await;
    let client = Client::new(ClientOptions {
        capabilities: ClientCapabilities {
            elicitation: Some(ElicitationCapability {
                form: None,
                url: Some(UrlElicitationCapability {}),
            }),
            ..Default::default()
        },
        ..Default::default()
    });
    client.set_elicitation_handler(Arc::new(AcceptEmpty)).unwrap();
    client.connect(transport).await.unwrap();

    let request = ElicitRequest::url("Visit this page", "https://example.com/auth", "e-1");
    let result = server
        .request(&request, RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(result.action, ElicitationAction::Accept);
}

#[tokio::test]
async fn test_strict_mode_blocks_undeclared_handler_registration() {
    let client = Client::new(ClientOptions {
        capabilities: ClientCapabilities::default(),
        protocol: ProtocolOptions {
            enforce_strict_capabilities: true,
            ..Default::default()
        },
        ..Default::default()
    });

    let err = client
        .set_request_handler(
            |_request: duplexmcp_protocol::types::CreateMessageRequest, _ctx| async move {
                Err::<duplexmcp_protocol::types::CreateMessageResult, _>(McpError::Internal(
                    "unreachable".into(),
                ))
            },
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Client does not support sampling (required for sampling/createMessage)"
    );
}

#[tokio::test]
async fn test_strict_mode_allows_declared_handler_registration() {
    let client = Client::new(ClientOptions {
        capabilities: ClientCapabilities {
            sampling: Some(SamplingCapability {}),
            ..Default::default()
        },
        protocol: ProtocolOptions {
            enforce_strict_capabilities: true,
            ..Default::default()
        },
        ..Default::default()
    });

    assert!(
        client
            .set_request_handler(
                |_request: duplexmcp_protocol::types::CreateMessageRequest, _ctx| async move {
                    Err::<duplexmcp_protocol::types::CreateMessageResult, _>(McpError::Internal(
                        "unused".into(),
                    ))
                },
            )
            .is_ok()
    );
}

#[tokio::test]
async fn test_session_id_skips_handshake() {
    // The fake server would answer initialize, but with a session id present
    // the client must not send one: drop the initialize handler and expect
    // Ready immediately.
    let (client_end, server_end) =
        InMemoryTransport::pair_with_session_ids(Some("session-1".to_string()), None);
    let server = Protocol::new(ProtocolOptions::default());
    server.connect(Arc::new(server_end)).await.unwrap();

    let client = Client::new(ClientOptions::default());
    client.connect(Arc::new(client_end)).await.unwrap();
    assert_eq!(client.state(), ConnectionState::Ready);
    // No handshake ran, so nothing was negotiated or cached.
    assert!(client.negotiated_version().is_none());
    assert!(client.server_capabilities().is_none());
}
