//! Control-side handle over the durable relay.
//!
//! The control actor never touches the mapping or channel tables directly;
//! every administrative change goes through the relay so the watcher is
//! the single writer applying them.

use crate::error::WatcherError;
use emojirelay_core::models::command::{CommandKind, CommandState, RelayCommand};
use emojirelay_core::{AppError, Database};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Enqueue handle for the control actor.
pub struct ControlHandle {
    db: Database,
    operator_id: Option<i64>,
}

impl ControlHandle {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            operator_id: None,
        }
    }

    /// Handle that stamps every enqueued command with the operator's id.
    pub fn for_operator(db: Database, operator_id: i64) -> Self {
        Self {
            db,
            operator_id: Some(operator_id),
        }
    }

    fn enqueue(&self, kind: CommandKind, payload: Value) -> Result<u64, AppError> {
        self.db.relay.enqueue(kind, payload, self.operator_id)
    }

    /// Enqueue an add-mapping command; `channel_id` of `None` means global.
    ///
    /// # Errors
    /// Returns an error when the enqueue write fails.
    pub fn add_mapping(
        &self,
        emoji: &str,
        custom_emoji_id: i64,
        channel_id: Option<i64>,
        description: Option<&str>,
    ) -> Result<u64, AppError> {
        self.enqueue(
            CommandKind::AddMapping,
            json!({
                "emoji": emoji,
                "custom_emoji_id": custom_emoji_id,
                "channel_id": channel_id,
                "description": description,
            }),
        )
    }

    /// Enqueue a remove-mapping command.
    ///
    /// # Errors
    /// Returns an error when the enqueue write fails.
    pub fn remove_mapping(&self, emoji: &str, channel_id: Option<i64>) -> Result<u64, AppError> {
        self.enqueue(
            CommandKind::RemoveMapping,
            json!({ "emoji": emoji, "channel_id": channel_id }),
        )
    }

    /// Enqueue an add-channel command.
    ///
    /// # Errors
    /// Returns an error when the enqueue write fails.
    pub fn add_channel(
        &self,
        channel_id: i64,
        display_name: Option<&str>,
    ) -> Result<u64, AppError> {
        self.enqueue(
            CommandKind::AddChannel,
            json!({ "channel_id": channel_id, "display_name": display_name }),
        )
    }

    /// Enqueue a remove-channel command.
    ///
    /// # Errors
    /// Returns an error when the enqueue write fails.
    pub fn remove_channel(&self, channel_id: i64) -> Result<u64, AppError> {
        self.enqueue(CommandKind::RemoveChannel, json!({ "channel_id": channel_id }))
    }

    /// Enqueue a list-mappings query.
    ///
    /// # Errors
    /// Returns an error when the enqueue write fails.
    pub fn list_mappings(&self) -> Result<u64, AppError> {
        self.enqueue(CommandKind::ListMappings, json!(null))
    }

    /// Enqueue a list-channels query.
    ///
    /// # Errors
    /// Returns an error when the enqueue write fails.
    pub fn list_channels(&self) -> Result<u64, AppError> {
        self.enqueue(CommandKind::ListChannels, json!(null))
    }

    /// Enqueue a status query.
    ///
    /// # Errors
    /// Returns an error when the enqueue write fails.
    pub fn status(&self) -> Result<u64, AppError> {
        self.enqueue(CommandKind::GetStatus, json!(null))
    }

    /// Poll until a command settles (done or failed) or `timeout` elapses.
    ///
    /// # Returns
    /// The settled row, including its `result` value.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id and `ResultTimeout` when the
    /// command does not settle within the deadline.
    pub async fn wait_for_result(
        &self,
        id: u64,
        timeout: Duration,
    ) -> Result<RelayCommand, WatcherError> {
        let deadline = Instant::now() + timeout;
        loop {
            let Some(command) = self.db.relay.get(id)? else {
                return Err(WatcherError::Storage(AppError::NotFound));
            };
            if matches!(command.state, CommandState::Done | CommandState::Failed) {
                return Ok(command);
            }
            if Instant::now() >= deadline {
                return Err(WatcherError::ResultTimeout(id));
            }
            tokio::time::sleep(RESULT_POLL_INTERVAL).await;
        }
    }
}
