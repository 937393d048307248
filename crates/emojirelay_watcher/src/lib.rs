//! Watcher actor: message rewriting plus the relay worker loop.
//!
//! The core crate owns storage and the rewrite algorithms; this crate wires
//! them to a platform client, polls the durable command relay, and exposes
//! the control-side enqueue handle.

/// Control-side handle for enqueueing relay commands.
pub mod control;
/// Watcher-side error types.
pub mod error;
/// Relay command execution.
pub mod executor;
/// Inbound message rewrite pipeline.
pub mod pipeline;
/// Platform client seam and inbound message shape.
pub mod platform;
/// Relay worker poll loop.
pub mod relay;

pub use control::ControlHandle;
pub use emojirelay_core::{AppError, Config, Database, Document, StyleKind, StyleRange};
pub use error::{PlatformError, WatcherError};
pub use pipeline::{handle_inbound, RewriteOutcome};
pub use platform::{InboundMessage, PlatformClient};
pub use relay::RelayWorker;
