//! Watcher-side error types.

use emojirelay_core::AppError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a platform client when editing a message.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform refused the edit (deleted message, missing rights).
    #[error("edit rejected: {0}")]
    Rejected(String),

    /// The platform asked us to back off before retrying.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Transport-level failure; the edit may or may not have landed.
    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the watcher's message and relay paths.
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error(transparent)]
    Storage(#[from] AppError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// A control-side wait outlived its deadline before the command settled.
    #[error("timed out waiting for command {0} to settle")]
    ResultTimeout(u64),
}
