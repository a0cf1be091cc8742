//! All MCP protocol types.
//!
//! Each request or notification is a params struct bound to its wire method
//! through the [`Request`] or [`Notification`] trait. The engine treats these
//! bindings as its only structural requirement: a method literal plus serde
//! parse/serialize behavior.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Common types (ids, roles, implementation info, `_meta` helpers).
pub mod core;

/// Capability sets exchanged during initialization.
pub mod capabilities;
/// Argument autocompletion request and result types.
pub mod completion;
/// Content blocks shared by prompts, tools, and sampling.
pub mod content;
/// Server-initiated user input requests.
pub mod elicitation;
/// Connection handshake types.
pub mod initialization;
/// Logging severity and the logging notification.
pub mod logging;
/// Prompt templates and retrieval.
pub mod prompts;
/// Ping, cancellation, and progress frames.
pub mod requests;
/// Resources, resource templates, and subscriptions.
pub mod resources;
/// Filesystem roots exposed by the client.
pub mod roots;
/// Bidirectional LLM sampling.
pub mod sampling;
/// Tool listing and invocation.
pub mod tools;

pub use self::capabilities::*;
pub use self::completion::*;
pub use self::content::*;
pub use self::core::*;
pub use self::elicitation::*;
pub use self::initialization::*;
pub use self::logging::*;
pub use self::prompts::*;
pub use self::requests::*;
pub use self::resources::*;
pub use self::roots::*;
pub use self::sampling::*;
pub use self::tools::*;

/// A typed MCP request: a params shape bound to a method literal and a result
/// shape. Implemented by every request params struct in this module.
pub trait Request: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Wire method name.
    const METHOD: &'static str;
    /// Result shape for this method.
    type Result: Serialize + DeserializeOwned + Send + Sync + 'static;
}

/// A typed MCP notification: a params shape bound to a method literal.
pub trait Notification: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Wire method name.
    const METHOD: &'static str;
}
