//! Data models for mappings, channels and relay commands.

/// Watched channel rows.
pub mod channel;
/// Relay command rows and lifecycle states.
pub mod command;
/// Emoji mapping rows and scopes.
pub mod mapping;

pub use channel::WatchedChannel;
pub use command::{CommandKind, CommandState, RelayCommand};
pub use mapping::{EmojiMapping, MappingScope};
