//! Emoji mapping rows and their storage scope.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Storage key reserved for globally scoped mappings.
///
/// Platform channel ids are never zero, so the value is free for the
/// global scope in the composite `(scope, emoji)` table key.
pub const GLOBAL_SCOPE_KEY: i64 = 0;

/// Scope of an emoji mapping: one channel, or every watched channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingScope {
    Global,
    Channel(i64),
}

impl MappingScope {
    /// Composite-key component used by the mapping table.
    pub fn storage_key(self) -> i64 {
        match self {
            MappingScope::Global => GLOBAL_SCOPE_KEY,
            MappingScope::Channel(id) => id,
        }
    }

    /// Rebuild a scope from its storage key.
    pub fn from_storage_key(key: i64) -> Self {
        if key == GLOBAL_SCOPE_KEY {
            MappingScope::Global
        } else {
            MappingScope::Channel(key)
        }
    }
}

/// One symbol-to-rich-variant mapping row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmojiMapping {
    pub emoji: String,
    pub custom_emoji_id: i64,
    pub scope: MappingScope,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmojiMapping {
    /// Build a validated mapping row.
    ///
    /// # Arguments
    /// - `emoji`: Source symbol; must be exactly one grapheme cluster after
    ///   trimming.
    /// - `custom_emoji_id`: Platform id of the rich variant.
    /// - `scope`: Global or per-channel scope.
    /// - `description`: Optional operator note.
    ///
    /// # Returns
    /// A new [`EmojiMapping`].
    ///
    /// # Errors
    /// Returns `BadRequest` when the key is not a single grapheme cluster or
    /// the channel scope uses the reserved key.
    pub fn new(
        emoji: &str,
        custom_emoji_id: i64,
        scope: MappingScope,
        description: Option<String>,
    ) -> Result<Self, AppError> {
        let emoji = emoji.trim();
        if emoji.graphemes(true).count() != 1 {
            return Err(AppError::BadRequest(format!(
                "mapping key must be exactly one grapheme cluster, got '{}'",
                emoji
            )));
        }
        if scope.storage_key() == GLOBAL_SCOPE_KEY && scope != MappingScope::Global {
            return Err(AppError::BadRequest(
                "channel scope cannot use the reserved global key".to_string(),
            ));
        }
        Ok(Self {
            emoji: emoji.to_string(),
            custom_emoji_id,
            scope,
            description,
            created_at: Utc::now(),
        })
    }
}
