//! Durable command relay backed by redb.
//!
//! The relay is an append-only mailbox: the control actor enqueues rows,
//! the watcher claims and completes them. redb serializes write
//! transactions, so a claim is an atomic read-check-write and two workers
//! can never claim the same row.

use crate::db::tables::RELAY;
use crate::error::AppError;
use crate::models::command::{CommandKind, CommandState, RelayCommand};
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};
use serde::Serialize;
use std::sync::Arc;

/// Per-state row counts, reported by the status command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelayCounts {
    pub pending: u64,
    pub claimed: u64,
    pub done: u64,
    pub failed: u64,
}

/// Accessor for the command relay table.
pub struct RelayDb {
    db: Arc<redb::Database>,
}

fn encode(command: &RelayCommand) -> Result<Vec<u8>, AppError> {
    Ok(serde_json::to_vec(command)?)
}

fn decode(bytes: &[u8]) -> Result<RelayCommand, AppError> {
    Ok(serde_json::from_slice(bytes)?)
}

impl RelayDb {
    /// Initialize the relay table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(RELAY)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Append a pending command and return its id.
    ///
    /// Ids are monotonic per database: one greater than the highest key
    /// ever written, starting at 1. Serialized write transactions make the
    /// read-increment-insert safe.
    ///
    /// # Errors
    /// Returns an error when serialization or storage operations fail.
    pub fn enqueue(
        &self,
        kind: CommandKind,
        payload: serde_json::Value,
        requested_by: Option<i64>,
    ) -> Result<u64, AppError> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut table = write_txn.open_table(RELAY)?;
            let id = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            let command = RelayCommand::new(id, kind, payload, requested_by);
            table.insert(id, encode(&command)?.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    /// Claim the next deliverable command for `worker_id`.
    ///
    /// Scans in id order inside one write transaction. Pending rows are
    /// preferred; when none exist, the lowest-id stale claim (claimed
    /// longer than `staleness` ago, never completed) is reclaimed instead.
    /// A reclaimed row therefore loses its original position behind newer
    /// pending work.
    ///
    /// # Returns
    /// `Ok(Some(command))` with the claimed row, `Ok(None)` when nothing
    /// is deliverable.
    ///
    /// # Errors
    /// Returns an error when storage access or row decoding fails.
    pub fn claim_next(
        &self,
        worker_id: &str,
        staleness: chrono::Duration,
    ) -> Result<Option<RelayCommand>, AppError> {
        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let claimed = {
            let mut table = write_txn.open_table(RELAY)?;

            let mut candidate: Option<RelayCommand> = None;
            for item in table.iter()? {
                let (_, value) = item?;
                let command = decode(value.value())?;
                match command.state {
                    CommandState::Pending => {
                        candidate = Some(command);
                        break;
                    }
                    CommandState::Claimed
                        if candidate.is_none() && command.claim_is_stale(now, staleness) =>
                    {
                        candidate = Some(command);
                    }
                    _ => {}
                }
            }

            let Some(mut command) = candidate else {
                return Ok(None);
            };
            if command.state == CommandState::Claimed {
                tracing::info!(
                    id = command.id,
                    previous_worker = command.claimed_by.as_deref().unwrap_or(""),
                    worker = worker_id,
                    "reclaiming stale command"
                );
            }
            command.state = CommandState::Claimed;
            command.claimed_at = Some(now);
            command.claimed_by = Some(worker_id.to_string());
            table.insert(command.id, encode(&command)?.as_slice())?;
            command
        };
        write_txn.commit()?;
        Ok(Some(claimed))
    }

    /// Mark a claimed command done and store its result.
    ///
    /// # Errors
    /// Returns `NotFound` when the id is unknown and `ClaimMismatch` when
    /// the row is not claimed by `worker_id` — the usual cause is a stale
    /// claim that another worker reclaimed in the meantime.
    pub fn complete(
        &self,
        id: u64,
        worker_id: &str,
        result: serde_json::Value,
    ) -> Result<(), AppError> {
        self.finish(id, worker_id, CommandState::Done, result)
    }

    /// Mark a claimed command failed and store the error text.
    ///
    /// # Errors
    /// Same contract as [`RelayDb::complete`].
    pub fn fail(&self, id: u64, worker_id: &str, error: &str) -> Result<(), AppError> {
        self.finish(
            id,
            worker_id,
            CommandState::Failed,
            serde_json::json!({ "error": error }),
        )
    }

    fn finish(
        &self,
        id: u64,
        worker_id: &str,
        state: CommandState,
        result: serde_json::Value,
    ) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RELAY)?;
            let Some(existing) = table.get(id)? else {
                return Err(AppError::NotFound);
            };
            let mut command = decode(existing.value())?;
            drop(existing);

            if command.state != CommandState::Claimed
                || command.claimed_by.as_deref() != Some(worker_id)
            {
                return Err(AppError::ClaimMismatch);
            }

            command.state = state;
            command.completed_at = Some(Utc::now());
            command.result = Some(result);
            table.insert(id, encode(&command)?.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Fetch a command by id.
    ///
    /// # Errors
    /// Returns an error when storage access or row decoding fails.
    pub fn get(&self, id: u64) -> Result<Option<RelayCommand>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RELAY)?;
        match table.get(id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// List the most recent commands, newest first.
    ///
    /// # Errors
    /// Returns an error when storage access or row decoding fails.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<RelayCommand>, AppError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RELAY)?;
        let mut commands = Vec::with_capacity(limit);
        for item in table.iter()?.rev() {
            let (_, value) = item?;
            commands.push(decode(value.value())?);
            if commands.len() >= limit {
                break;
            }
        }
        Ok(commands)
    }

    /// Count rows per lifecycle state.
    ///
    /// # Errors
    /// Returns an error when storage access or row decoding fails.
    pub fn count_by_state(&self) -> Result<RelayCounts, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RELAY)?;
        let mut counts = RelayCounts::default();
        for item in table.iter()? {
            let (_, value) = item?;
            match decode(value.value())?.state {
                CommandState::Pending => counts.pending += 1,
                CommandState::Claimed => counts.claimed += 1,
                CommandState::Done => counts.done += 1,
                CommandState::Failed => counts.failed += 1,
            }
        }
        Ok(counts)
    }
}
