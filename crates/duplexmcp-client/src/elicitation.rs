//! Client-side elicitation wrapper: mode gating and schema default injection.

use serde_json::{Map, Value};
use std::sync::Arc;

use duplexmcp_protocol::types::{ElicitRequest, ElicitationAction, ElicitationMode};
use duplexmcp_protocol::{McpError, McpResult};

use crate::handlers::ElicitationHandler;
use crate::Client;

/// Install the wrapped `elicitation/create` handler on the client's engine.
pub(crate) fn install_elicitation_handler(
    client: &Client,
    handler: Arc<dyn ElicitationHandler>,
) -> McpResult<()> {
    let elicitation = client.normalized_capabilities().elicitation.clone();
    client.set_request_handler(move |request: ElicitRequest, _ctx| {
        let handler = handler.clone();
        let elicitation = elicitation.clone();
        async move {
            let mode = request.mode.unwrap_or(ElicitationMode::Form);
            let caps = elicitation.as_ref().ok_or_else(|| {
                McpError::InvalidRequest("Client does not support elicitation".to_string())
            })?;
            match mode {
                ElicitationMode::Form if caps.form.is_none() => {
                    return Err(McpError::InvalidRequest(
                        "Client does not support form elicitation".to_string(),
                    ));
                }
                ElicitationMode::Url if caps.url.is_none() => {
                    return Err(McpError::InvalidRequest(
                        "Client does not support url elicitation".to_string(),
                    ));
                }
                _ => {}
            }

            let apply_defaults = mode == ElicitationMode::Form
                && caps
                    .form
                    .as_ref()
                    .is_some_and(|form| form.apply_defaults.unwrap_or(false));
            let requested_schema = request.requested_schema.clone();

            let mut result = handler.handle(request).await?;

            if apply_defaults
                && result.action == ElicitationAction::Accept
                && let Some(schema) = &requested_schema
            {
                let content = result.content.get_or_insert_with(Map::new);
                apply_schema_defaults(content, schema);
            }
            Ok(result)
        }
    })
}

/// Fill missing fields that carry a `default` in the requested schema,
/// recursing into nested objects and `oneOf`/`anyOf` branches.
///
/// Branch defaults are applied unconditionally, without checking which branch
/// the content actually satisfies; a field meant to stay absent in one branch
/// may be populated from another. See DESIGN.md.
pub fn apply_schema_defaults(content: &mut Map<String, Value>, schema: &Value) {
    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            apply_property_default(content, name, property);
        }
    }
    for keyword in ["oneOf", "anyOf"] {
        if let Some(branches) = schema.get(keyword).and_then(Value::as_array) {
            for branch in branches {
                apply_schema_defaults(content, branch);
            }
        }
    }
}

fn apply_property_default(content: &mut Map<String, Value>, name: &str, property: &Value) {
    if !content.contains_key(name) {
        if let Some(default) = property.get("default") {
            content.insert(name.to_string(), default.clone());
        } else {
            // A missing field may still pick up a default from one of the
            // property's own branches.
            for keyword in ["oneOf", "anyOf"] {
                if content.contains_key(name) {
                    break;
                }
                if let Some(branches) = property.get(keyword).and_then(Value::as_array) {
                    for branch in branches {
                        if let Some(default) = branch.get("default") {
                            content.insert(name.to_string(), default.clone());
                            break;
                        }
                    }
                }
            }
        }
    }

    let has_nested_shape = property.get("properties").is_some()
        || property.get("oneOf").is_some()
        || property.get("anyOf").is_some();
    if has_nested_shape
        && let Some(Value::Object(nested)) = content.get_mut(name)
    {
        apply_schema_defaults(nested, property);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn apply(content: Value, schema: Value) -> Value {
        let mut map = content.as_object().cloned().unwrap();
        apply_schema_defaults(&mut map, &schema);
        Value::Object(map)
    }

    #[test]
    fn test_fills_primitive_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "verbose": {"type": "boolean", "default": false},
                "name": {"type": "string", "default": "anonymous"},
                "retries": {"type": "integer", "default": 3},
                "level": {"type": "string", "enum": ["low", "high"], "default": "low"},
                "tags": {
                    "type": "array",
                    "items": {"type": "string", "enum": ["a", "b"]},
                    "default": ["a"],
                },
            },
            "required": ["verbose", "name", "retries", "level", "tags"],
        });
        assert_eq!(
            apply(json!({}), schema),
            json!({
                "verbose": false,
                "name": "anonymous",
                "retries": 3,
                "level": "low",
                "tags": ["a"],
            })
        );
    }

    #[test]
    fn test_existing_values_are_kept() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string", "default": "anonymous"}},
        });
        assert_eq!(
            apply(json!({"name": "given"}), schema),
            json!({"name": "given"})
        );
    }

    #[test]
    fn test_recurses_into_nested_objects() {
        let schema = json!({
            "type": "object",
            "properties": {
                "options": {
                    "type": "object",
                    "properties": {"depth": {"type": "integer", "default": 1}},
                },
            },
        });
        assert_eq!(
            apply(json!({"options": {}}), schema),
            json!({"options": {"depth": 1}})
        );
    }

    #[test]
    fn test_missing_nested_object_without_default_stays_absent() {
        let schema = json!({
            "type": "object",
            "properties": {
                "options": {
                    "type": "object",
                    "properties": {"depth": {"type": "integer", "default": 1}},
                },
            },
        });
        assert_eq!(apply(json!({}), schema), json!({}));
    }

    #[test]
    fn test_one_of_branches_apply_unconditionally() {
        let schema = json!({
            "type": "object",
            "oneOf": [
                {"properties": {"a": {"type": "string", "default": "x"}}},
                {"properties": {"b": {"type": "string", "default": "y"}}},
            ],
        });
        // Both branches contribute; over-population is the preserved behavior.
        assert_eq!(apply(json!({}), schema), json!({"a": "x", "b": "y"}));
    }

    #[test]
    fn test_property_level_any_of_default() {
        let schema = json!({
            "type": "object",
            "properties": {
                "choice": {
                    "anyOf": [
                        {"type": "string"},
                        {"type": "integer", "default": 7},
                    ],
                },
            },
        });
        assert_eq!(apply(json!({}), schema), json!({"choice": 7}));
    }
}
