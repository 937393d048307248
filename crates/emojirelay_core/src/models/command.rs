//! Relay command rows and lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Administrative command kinds accepted by the watcher.
///
/// The control surface translates operator intents into one of these; the
/// core never parses free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    AddMapping,
    RemoveMapping,
    AddChannel,
    RemoveChannel,
    ListMappings,
    ListChannels,
    GetStatus,
}

/// Lifecycle state of a relay command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandState {
    Pending,
    Claimed,
    Done,
    Failed,
}

/// One durable mailbox row.
///
/// `payload` and `result` are opaque kind-specific JSON values passed
/// through unchanged by the relay store; only the executor interprets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayCommand {
    pub id: u64,
    pub kind: CommandKind,
    pub payload: serde_json::Value,
    pub requested_by: Option<i64>,
    pub state: CommandState,
    pub enqueued_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claimed_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<serde_json::Value>,
}

impl RelayCommand {
    /// Create a fresh pending command.
    pub fn new(
        id: u64,
        kind: CommandKind,
        payload: serde_json::Value,
        requested_by: Option<i64>,
    ) -> Self {
        Self {
            id,
            kind,
            payload,
            requested_by,
            state: CommandState::Pending,
            enqueued_at: Utc::now(),
            claimed_at: None,
            claimed_by: None,
            completed_at: None,
            result: None,
        }
    }

    /// Whether an uncompleted claim has outlived the staleness threshold.
    pub fn claim_is_stale(&self, now: DateTime<Utc>, staleness: chrono::Duration) -> bool {
        if self.state != CommandState::Claimed || self.completed_at.is_some() {
            return false;
        }
        match self.claimed_at {
            Some(claimed_at) => now - claimed_at > staleness,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_kind_uses_kebab_case_on_the_wire() {
        let encoded = serde_json::to_string(&CommandKind::AddMapping).expect("encode kind");
        assert_eq!(encoded, "\"add-mapping\"");
        let decoded: CommandKind =
            serde_json::from_str("\"remove-channel\"").expect("decode kind");
        assert_eq!(decoded, CommandKind::RemoveChannel);
    }

    #[test]
    fn fresh_commands_are_pending_and_unclaimed() {
        let cmd = RelayCommand::new(1, CommandKind::GetStatus, json!(null), Some(42));
        assert_eq!(cmd.state, CommandState::Pending);
        assert!(cmd.claimed_at.is_none());
        assert!(cmd.result.is_none());
        assert!(!cmd.claim_is_stale(Utc::now(), chrono::Duration::seconds(0)));
    }

    #[test]
    fn stale_detection_requires_an_uncompleted_claim() {
        let mut cmd = RelayCommand::new(1, CommandKind::GetStatus, json!(null), None);
        let now = Utc::now();
        cmd.state = CommandState::Claimed;
        cmd.claimed_at = Some(now - chrono::Duration::seconds(120));
        cmd.claimed_by = Some("watcher-a".to_string());
        assert!(cmd.claim_is_stale(now, chrono::Duration::seconds(60)));

        cmd.completed_at = Some(now);
        assert!(!cmd.claim_is_stale(now, chrono::Duration::seconds(60)));
    }
}
