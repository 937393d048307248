//! Database layer for emojirelay.
//!
//! One redb instance backs three tables: the mapping table, the watched
//! channel set, and the durable command relay. redb serializes write
//! transactions, which is what gives the relay claim its compare-and-set
//! semantics.

/// Read-through cache with explicit invalidation.
pub mod cache;
/// Watched channel storage helpers.
pub mod channel;
/// Emoji mapping storage helpers.
pub mod mapping;
/// Durable command relay store.
pub mod relay;
/// Table definitions.
pub mod tables;

use crate::error::AppError;
use std::path::Path;
use std::sync::Arc;

pub use cache::ReadCache;
pub use channel::ChannelDb;
pub use mapping::MappingDb;
pub use relay::{RelayCounts, RelayDb};

/// Database handle with access to all storage tables.
pub struct Database {
    pub db: Arc<redb::Database>,
    pub mappings: MappingDb,
    pub channels: ChannelDb,
    pub relay: RelayDb,
}

#[cfg(test)]
mod tests;

impl Database {
    /// Open the database directory and initialize tables.
    ///
    /// # Returns
    /// A fully initialized [`Database`].
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or redb cannot
    /// open the database or tables.
    pub fn new(dir: &str) -> Result<Self, AppError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::StorageMessage(format!("cannot create {}: {}", dir, e)))?;
        let db = Arc::new(redb::Database::create(
            Path::new(dir).join(tables::REDB_FILE_NAME),
        )?);
        Self::from_shared(db)
    }

    /// Build a database handle from an existing shared redb instance.
    ///
    /// Used when multiple subsystems in the same process need independent
    /// accessors without reopening the database path.
    ///
    /// # Errors
    /// Returns an error if table initialization fails.
    pub fn from_shared(db: Arc<redb::Database>) -> Result<Self, AppError> {
        Ok(Self {
            mappings: MappingDb::new(db.clone())?,
            channels: ChannelDb::new(db.clone())?,
            relay: RelayDb::new(db.clone())?,
            db,
        })
    }

    /// Clone this handle for another subsystem in the same process.
    ///
    /// The control and watcher actors each hold their own share; the only
    /// coupling between them is the underlying storage.
    ///
    /// # Errors
    /// Returns an error if table initialization fails.
    pub fn share(&self) -> Result<Self, AppError> {
        Self::from_shared(self.db.clone())
    }
}
