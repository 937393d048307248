//! Core domain library for emojirelay (documents, scanning, planning, storage).

/// Configuration loading and defaults.
pub mod config;
/// Shared default values.
pub mod constants;
/// Database access layer (mappings, channels, command relay).
pub mod db;
/// Formatted-text document model with UTF-16 offset arithmetic.
pub mod document;
/// Application error types (storage/domain).
pub mod error;
/// Data models for mappings, channels and relay commands.
pub mod models;
/// Replacement planning against mapping snapshots.
pub mod plan;
/// Left-to-right rewrite pass over a planned document.
pub mod rewrite;
/// Grapheme-cluster symbol index.
pub mod scan;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use db::Database;
pub use document::{Document, StyleKind, StyleRange};
pub use error::AppError;
