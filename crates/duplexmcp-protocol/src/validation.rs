//! Schema validation contract and the default `jsonschema`-backed validator.
//!
//! The engine treats JSON schemas as opaque: it hands a schema to a
//! [`SchemaValidator`], gets back a reusable [`CompiledSchema`], and asks it
//! to accept or reject instances. Compilation results are memoized per
//! validator instance.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{McpError, McpResult};

/// A schema compiled once and reusable for many validations.
pub trait CompiledSchema: Send + Sync + fmt::Debug {
    /// Validate an instance. `Err` carries the validation error message.
    fn validate(&self, instance: &Value) -> Result<(), String>;
}

/// Compiles JSON schemas into reusable validators.
pub trait SchemaValidator: Send + Sync {
    /// Compile `schema`, or return a memoized validator for it.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::Internal`] when the schema itself is invalid.
    fn get_validator(&self, schema: &Value) -> McpResult<Arc<dyn CompiledSchema>>;
}

/// Default validator backed by the `jsonschema` crate, memoizing compiled
/// schemas by their serialized form.
#[derive(Default)]
pub struct JsonSchemaValidator {
    cache: Mutex<HashMap<String, Arc<dyn CompiledSchema>>>,
}

impl JsonSchemaValidator {
    /// Create an empty validator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}

#[derive(Debug)]
struct CompiledJsonSchema(jsonschema::Validator);

impl CompiledSchema for CompiledJsonSchema {
    fn validate(&self, instance: &Value) -> Result<(), String> {
        self.0.validate(instance).map_err(|err| err.to_string())
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn get_validator(&self, schema: &Value) -> McpResult<Arc<dyn CompiledSchema>> {
        let key = schema.to_string();
        if let Some(compiled) = self.cache.lock().get(&key) {
            return Ok(compiled.clone());
        }
        let validator = jsonschema::validator_for(schema)
            .map_err(|err| McpError::Internal(format!("Invalid schema: {err}")))?;
        let compiled: Arc<dyn CompiledSchema> = Arc::new(CompiledJsonSchema(validator));
        self.cache.lock().insert(key, compiled.clone());
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_matching_instance() {
        let validator = JsonSchemaValidator::new();
        let compiled = validator
            .get_validator(&json!({
                "type": "object",
                "properties": {"x": {"type": "integer"}},
                "required": ["x"],
            }))
            .unwrap();
        assert!(compiled.validate(&json!({"x": 3})).is_ok());
    }

    #[test]
    fn test_rejects_wrong_type() {
        let validator = JsonSchemaValidator::new();
        let compiled = validator
            .get_validator(&json!({
                "type": "object",
                "properties": {"x": {"type": "integer"}},
                "required": ["x"],
            }))
            .unwrap();
        assert!(compiled.validate(&json!({"x": "not-an-int"})).is_err());
    }

    #[test]
    fn test_invalid_schema_is_internal_error() {
        let validator = JsonSchemaValidator::new();
        let err = validator
            .get_validator(&json!({"type": "not-a-type"}))
            .unwrap_err();
        assert!(matches!(err, McpError::Internal(_)));
    }

    #[test]
    fn test_memoizes_compilation() {
        let validator = JsonSchemaValidator::new();
        let schema = json!({"type": "object"});
        let first = validator.get_validator(&schema).unwrap();
        let second = validator.get_validator(&schema).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_composition_keywords() {
        let validator = JsonSchemaValidator::new();
        let compiled = validator
            .get_validator(&json!({
                "type": "object",
                "properties": {
                    "choice": {
                        "oneOf": [
                            {"type": "string", "enum": ["a", "b"]},
                            {"type": "integer", "minimum": 0},
                        ]
                    },
                    "tags": {
                        "type": "array",
                        "items": {"type": "string"},
                        "minItems": 1,
                        "uniqueItems": true,
                    },
                },
            }))
            .unwrap();
        assert!(compiled.validate(&json!({"choice": "a", "tags": ["x"]})).is_ok());
        assert!(compiled.validate(&json!({"choice": -1})).is_err());
        assert!(compiled.validate(&json!({"tags": ["x", "x"]})).is_err());
    }
}
