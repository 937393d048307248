//! Emoji mapping storage operations backed by redb.

use crate::db::tables::MAPPINGS;
use crate::error::AppError;
use crate::models::mapping::{EmojiMapping, MappingScope};
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

/// Accessor for the emoji mapping table.
pub struct MappingDb {
    db: Arc<redb::Database>,
}

impl MappingDb {
    /// Initialize the mapping table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MAPPINGS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Insert or replace a mapping row.
    ///
    /// Last write wins for an existing `(scope, emoji)` key.
    ///
    /// # Errors
    /// Returns an error when serialization or storage operations fail.
    pub fn upsert(&self, mapping: &EmojiMapping) -> Result<(), AppError> {
        let encoded = bincode::serialize(mapping)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MAPPINGS)?;
            table.insert(
                (mapping.scope.storage_key(), mapping.emoji.as_str()),
                encoded.as_slice(),
            )?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove a mapping row.
    ///
    /// # Returns
    /// `true` when a row was removed, `false` when the key was absent.
    /// Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns an error when storage operations fail.
    pub fn remove(&self, emoji: &str, scope: MappingScope) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(MAPPINGS)?;
            let removed = table.remove((scope.storage_key(), emoji))?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Fetch a mapping by key.
    ///
    /// # Returns
    /// `Ok(Some(mapping))` when found, `Ok(None)` when missing.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, emoji: &str, scope: MappingScope) -> Result<Option<EmojiMapping>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MAPPINGS)?;
        match table.get((scope.storage_key(), emoji))? {
            Some(value) => Ok(Some(bincode::deserialize(value.value())?)),
            None => Ok(None),
        }
    }

    /// List every mapping row across all scopes.
    ///
    /// The mapping table is operator-curated and small; callers filter by
    /// scope themselves.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn list(&self) -> Result<Vec<EmojiMapping>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MAPPINGS)?;
        let mut mappings = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            mappings.push(bincode::deserialize(value.value())?);
        }
        Ok(mappings)
    }

    /// Count mapping rows across all scopes.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn count(&self) -> Result<u64, AppError> {
        Ok(self.list()?.len() as u64)
    }
}
