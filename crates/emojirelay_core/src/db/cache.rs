//! Read-through cache over the channel and mapping tables.
//!
//! The watcher consults the watch set and mapping table on every inbound
//! message; both are small and change only through relay commands, so the
//! executor invalidates the relevant side after each successful write and
//! the next read repopulates from storage.

use crate::db::Database;
use crate::error::AppError;
use crate::models::channel::WatchedChannel;
use crate::models::mapping::EmojiMapping;
use crate::plan::MappingSnapshot;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cached read access for the message path.
pub struct ReadCache {
    db: Database,
    channels: RwLock<Option<Arc<HashMap<i64, WatchedChannel>>>>,
    mappings: RwLock<Option<Arc<Vec<EmojiMapping>>>>,
}

fn read_guard<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, AppError> {
    lock.read()
        .map_err(|_| AppError::StorageMessage("cache lock poisoned".to_string()))
}

fn write_guard<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, AppError> {
    lock.write()
        .map_err(|_| AppError::StorageMessage("cache lock poisoned".to_string()))
}

impl ReadCache {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            channels: RwLock::new(None),
            mappings: RwLock::new(None),
        }
    }

    /// Whether a channel is actively watched, via the cached watch set.
    ///
    /// # Errors
    /// Returns an error when a cold read from storage fails.
    pub fn is_watched(&self, channel_id: i64) -> Result<bool, AppError> {
        let channels = self.cached_channels()?;
        Ok(channels.get(&channel_id).is_some_and(|c| c.active))
    }

    /// Build the per-channel mapping snapshot from the cached mapping list.
    ///
    /// # Errors
    /// Returns an error when a cold read from storage fails.
    pub fn mapping_snapshot(&self, channel_id: i64) -> Result<MappingSnapshot, AppError> {
        let mappings = self.cached_mappings()?;
        Ok(MappingSnapshot::for_channel(&mappings, channel_id))
    }

    /// Drop the cached mapping list; the next read repopulates it.
    ///
    /// # Errors
    /// Returns an error when the cache lock is poisoned.
    pub fn invalidate_mappings(&self) -> Result<(), AppError> {
        *write_guard(&self.mappings)? = None;
        Ok(())
    }

    /// Drop the cached watch set; the next read repopulates it.
    ///
    /// # Errors
    /// Returns an error when the cache lock is poisoned.
    pub fn invalidate_channels(&self) -> Result<(), AppError> {
        *write_guard(&self.channels)? = None;
        Ok(())
    }

    fn cached_channels(&self) -> Result<Arc<HashMap<i64, WatchedChannel>>, AppError> {
        if let Some(cached) = read_guard(&self.channels)?.as_ref() {
            return Ok(cached.clone());
        }
        let mut slot = write_guard(&self.channels)?;
        // Another reader may have repopulated while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            return Ok(cached.clone());
        }
        let loaded: HashMap<i64, WatchedChannel> = self
            .db
            .channels
            .list_active()?
            .into_iter()
            .map(|c| (c.channel_id, c))
            .collect();
        let loaded = Arc::new(loaded);
        *slot = Some(loaded.clone());
        Ok(loaded)
    }

    fn cached_mappings(&self) -> Result<Arc<Vec<EmojiMapping>>, AppError> {
        if let Some(cached) = read_guard(&self.mappings)?.as_ref() {
            return Ok(cached.clone());
        }
        let mut slot = write_guard(&self.mappings)?;
        if let Some(cached) = slot.as_ref() {
            return Ok(cached.clone());
        }
        let loaded = Arc::new(self.db.mappings.list()?);
        *slot = Some(loaded.clone());
        Ok(loaded)
    }
}
