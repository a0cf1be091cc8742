//! Side-channel completer registry.
//!
//! Autocompletion callbacks attach to argument slots through a registry keyed
//! by completion reference and argument name. Attachment never alters how an
//! argument parses or validates; [`CompleterRegistry::is_completable`] and
//! [`CompleterRegistry::get`] are the only observers.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::McpResult;
use crate::types::CompletionReference;

/// Produces completion suggestions for a partially typed argument value.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Suggest values matching `value`, optionally using already-resolved
    /// sibling arguments.
    async fn complete(
        &self,
        value: &str,
        context: Option<&HashMap<String, String>>,
    ) -> McpResult<Vec<String>>;
}

/// A [`Completer`] built from a synchronous closure.
pub struct FnCompleter<F>(
    /// The completion closure.
    pub F,
);

#[async_trait]
impl<F> Completer for FnCompleter<F>
where
    F: Fn(&str, Option<&HashMap<String, String>>) -> Vec<String> + Send + Sync,
{
    async fn complete(
        &self,
        value: &str,
        context: Option<&HashMap<String, String>>,
    ) -> McpResult<Vec<String>> {
        Ok((self.0)(value, context))
    }
}

/// Registry mapping `(reference, argument name)` to a completer.
#[derive(Default)]
pub struct CompleterRegistry {
    entries: RwLock<HashMap<(CompletionReference, String), Arc<dyn Completer>>>,
}

impl CompleterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a completer to an argument slot, replacing any existing one.
    pub fn attach(
        &self,
        reference: CompletionReference,
        argument: impl Into<String>,
        completer: Arc<dyn Completer>,
    ) {
        self.entries
            .write()
            .insert((reference, argument.into()), completer);
    }

    /// Whether a completer is attached to the given argument slot.
    pub fn is_completable(&self, reference: &CompletionReference, argument: &str) -> bool {
        self.entries
            .read()
            .contains_key(&(reference.clone(), argument.to_string()))
    }

    /// The completer attached to the given argument slot, if any.
    pub fn get(
        &self,
        reference: &CompletionReference,
        argument: &str,
    ) -> Option<Arc<dyn Completer>> {
        self.entries
            .read()
            .get(&(reference.clone(), argument.to_string()))
            .cloned()
    }
}

impl fmt::Debug for CompleterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompleterRegistry")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt_ref(name: &str) -> CompletionReference {
        CompletionReference::Prompt { name: name.into() }
    }

    #[tokio::test]
    async fn test_attach_and_complete() {
        let registry = CompleterRegistry::new();
        registry.attach(
            prompt_ref("greet"),
            "language",
            Arc::new(FnCompleter(
                |value: &str, _ctx: Option<&HashMap<String, String>>| {
                    ["english", "spanish", "french"]
                        .iter()
                        .filter(|l| l.starts_with(value))
                        .map(|l| (*l).to_string())
                        .collect::<Vec<String>>()
                },
            )),
        );

        assert!(registry.is_completable(&prompt_ref("greet"), "language"));
        assert!(!registry.is_completable(&prompt_ref("greet"), "other"));

        let completer = registry.get(&prompt_ref("greet"), "language").unwrap();
        let values = completer.complete("s", None).await.unwrap();
        assert_eq!(values, vec!["spanish".to_string()]);
    }

    #[tokio::test]
    async fn test_context_passthrough() {
        let registry = CompleterRegistry::new();
        registry.attach(
            prompt_ref("travel"),
            "city",
            Arc::new(FnCompleter(|_value: &str, ctx: Option<&HashMap<String, String>>| {
                match ctx.and_then(|c| c.get("country")).map(String::as_str) {
                    Some("fr") => vec!["paris".into(), "lyon".into()],
                    _ => vec![],
                }
            })),
        );

        let completer = registry.get(&prompt_ref("travel"), "city").unwrap();
        let mut context = HashMap::new();
        context.insert("country".to_string(), "fr".to_string());
        let values = completer.complete("", Some(&context)).await.unwrap();
        assert_eq!(values.len(), 2);
    }
}
