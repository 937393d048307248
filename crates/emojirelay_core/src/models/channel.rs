//! Watched channel rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Membership row of the watch set.
///
/// Removal deactivates the row instead of deleting it, so re-adding a
/// channel keeps its original `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchedChannel {
    pub channel_id: i64,
    pub display_name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl WatchedChannel {
    /// Create a new active channel row.
    pub fn new(channel_id: i64, display_name: String) -> Self {
        Self {
            channel_id,
            display_name,
            active: true,
            created_at: Utc::now(),
        }
    }
}
