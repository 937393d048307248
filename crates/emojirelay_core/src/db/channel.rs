//! Watched channel storage operations backed by redb.

use crate::db::tables::CHANNELS;
use crate::error::AppError;
use crate::models::channel::WatchedChannel;
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

/// Accessor for the watched channel table.
pub struct ChannelDb {
    db: Arc<redb::Database>,
}

impl ChannelDb {
    /// Initialize the channel table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CHANNELS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Add a channel to the watch set, or reactivate an existing row.
    ///
    /// Reactivation keeps the original `created_at` but refreshes the
    /// display name.
    ///
    /// # Returns
    /// The stored row after the write.
    ///
    /// # Errors
    /// Returns an error when serialization or storage operations fail.
    pub fn upsert(&self, channel_id: i64, display_name: &str) -> Result<WatchedChannel, AppError> {
        let write_txn = self.db.begin_write()?;
        let channel = {
            let mut table = write_txn.open_table(CHANNELS)?;
            let channel = match table.get(channel_id)? {
                Some(existing) => {
                    let mut channel: WatchedChannel = bincode::deserialize(existing.value())?;
                    drop(existing);
                    channel.active = true;
                    channel.display_name = display_name.to_string();
                    channel
                }
                None => WatchedChannel::new(channel_id, display_name.to_string()),
            };
            let encoded = bincode::serialize(&channel)?;
            table.insert(channel_id, encoded.as_slice())?;
            channel
        };
        write_txn.commit()?;
        Ok(channel)
    }

    /// Deactivate a channel without deleting its row.
    ///
    /// # Returns
    /// `true` when an active row was deactivated, `false` when the channel
    /// was unknown or already inactive.
    ///
    /// # Errors
    /// Returns an error when storage access or serialization fails.
    pub fn deactivate(&self, channel_id: i64) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        let deactivated = {
            let mut table = write_txn.open_table(CHANNELS)?;
            let Some(existing) = table.get(channel_id)? else {
                return Ok(false);
            };
            let mut channel: WatchedChannel = bincode::deserialize(existing.value())?;
            drop(existing);
            if !channel.active {
                return Ok(false);
            }
            channel.active = false;
            let encoded = bincode::serialize(&channel)?;
            table.insert(channel_id, encoded.as_slice())?;
            true
        };
        write_txn.commit()?;
        Ok(deactivated)
    }

    /// Fetch a channel row (active or not).
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, channel_id: i64) -> Result<Option<WatchedChannel>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHANNELS)?;
        match table.get(channel_id)? {
            Some(value) => Ok(Some(bincode::deserialize(value.value())?)),
            None => Ok(None),
        }
    }

    /// Whether a channel is currently watched.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn is_watched(&self, channel_id: i64) -> Result<bool, AppError> {
        Ok(self.get(channel_id)?.is_some_and(|c| c.active))
    }

    /// List every active channel row.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn list_active(&self) -> Result<Vec<WatchedChannel>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHANNELS)?;
        let mut channels = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let channel: WatchedChannel = bincode::deserialize(value.value())?;
            if channel.active {
                channels.push(channel);
            }
        }
        Ok(channels)
    }

    /// Count active channel rows.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn count_active(&self) -> Result<u64, AppError> {
        Ok(self.list_active()?.len() as u64)
    }
}
