//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Emoji mapping rows keyed `(scope key, emoji)` (`EmojiMapping`,
/// bincode-encoded). Scope key 0 is the global scope.
pub const MAPPINGS: TableDefinition<(i64, &str), &[u8]> =
    TableDefinition::new("emoji_mappings");

/// Watched channel rows keyed by channel id (`WatchedChannel`,
/// bincode-encoded).
pub const CHANNELS: TableDefinition<i64, &[u8]> = TableDefinition::new("watched_channels");

/// Relay command rows keyed by monotonic id (`RelayCommand`,
/// JSON-encoded — payloads and results are opaque JSON values, which
/// bincode cannot round-trip).
pub const RELAY: TableDefinition<u64, &[u8]> = TableDefinition::new("command_relay");
