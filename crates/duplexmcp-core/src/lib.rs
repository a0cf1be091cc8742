//! Shared MCP protocol engine.
//!
//! [`Protocol`] is the multiplexer both roles embed: it correlates requests
//! with responses, tracks concurrent in-flight requests, streams progress,
//! propagates cancellation in both directions, enforces per-request timeouts,
//! and debounces configured notifications. The client and server crates layer
//! their method surfaces on top of it.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![allow(clippy::module_name_repetitions)]

/// Cancellation signal carrying a reason.
pub mod cancellation;
/// Context handed to inbound request handlers.
pub mod context;
/// The protocol multiplexer.
pub mod engine;

pub use cancellation::CancellationSignal;
pub use context::RequestContext;
pub use engine::{
    ConnectionState, DEFAULT_REQUEST_TIMEOUT, NotificationOptions, ProgressCallback, Protocol,
    ProtocolOptions, RequestOptions,
};
