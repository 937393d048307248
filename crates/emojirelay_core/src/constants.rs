//! Shared default values for configuration.

/// Default relay poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Default staleness threshold for claimed commands, in seconds.
pub const DEFAULT_CLAIM_STALENESS_SECS: u64 = 60;

/// Default per-tick execution deadline in milliseconds.
pub const DEFAULT_TICK_DEADLINE_MS: u64 = 30_000;

/// Default number of retries for a rate-limited platform edit.
pub const DEFAULT_MAX_EDIT_RETRIES: u32 = 3;
