//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_CLAIM_STALENESS_SECS, DEFAULT_MAX_EDIT_RETRIES, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_TICK_DEADLINE_MS,
};
use crate::plan::PlaceholderPolicy;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for emojirelay.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db_path: String,
    pub poll_interval_ms: u64,
    pub claim_staleness_secs: u64,
    pub tick_deadline_ms: u64,
    pub max_edit_retries: u32,
    pub placeholder: PlaceholderPolicy,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    // Prefer explicit HOME if set (Unix, some Windows shells)
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows USERPROFILE (standard)
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    // Fallback to current directory if available
    std::env::current_dir().ok()
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("DB_PATH").map(expand_tilde).unwrap_or_else(|_| {
                let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
                let cache_dir = home.join(".cache").join("emojirelay");
                cache_dir.join("db").to_string_lossy().to_string()
            }),
            poll_interval_ms: env_u64("RELAY_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
            claim_staleness_secs: env_u64("CLAIM_STALENESS_SECS", DEFAULT_CLAIM_STALENESS_SECS),
            tick_deadline_ms: env_u64("RELAY_TICK_DEADLINE_MS", DEFAULT_TICK_DEADLINE_MS),
            max_edit_retries: env_u64("MAX_EDIT_RETRIES", u64::from(DEFAULT_MAX_EDIT_RETRIES))
                as u32,
            // Unset keeps the replaced cluster visible under the rich-glyph
            // range; a set value (possibly empty) replaces it outright.
            placeholder: match env::var("PLACEHOLDER_TEXT") {
                Ok(text) => PlaceholderPolicy::Placeholder(text),
                Err(_) => PlaceholderPolicy::RetainOriginal,
            },
        }
    }

    /// Relay poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Per-tick execution deadline as a [`Duration`].
    pub fn tick_deadline(&self) -> Duration {
        Duration::from_millis(self.tick_deadline_ms)
    }

    /// Claim staleness threshold as a [`chrono::Duration`].
    pub fn claim_staleness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.claim_staleness_secs as i64)
    }
}
