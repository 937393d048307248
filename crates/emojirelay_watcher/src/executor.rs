//! Relay command execution.
//!
//! The executor is the only interpreter of command payloads. Every command
//! kind has a typed payload struct; a malformed payload fails the command
//! with a decode error instead of poisoning the worker loop.

use emojirelay_core::db::ReadCache;
use emojirelay_core::models::command::{CommandKind, RelayCommand};
use emojirelay_core::models::mapping::{EmojiMapping, MappingScope};
use emojirelay_core::{AppError, Database};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct AddMappingPayload {
    emoji: String,
    custom_emoji_id: i64,
    #[serde(default)]
    channel_id: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoveMappingPayload {
    emoji: String,
    #[serde(default)]
    channel_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AddChannelPayload {
    channel_id: i64,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoveChannelPayload {
    channel_id: i64,
}

fn decode_payload<T: DeserializeOwned>(value: &Value) -> Result<T, AppError> {
    // A null payload means "all defaults" for kinds that allow it.
    let effective = if value.is_null() {
        json!({})
    } else {
        value.clone()
    };
    Ok(serde_json::from_value(effective)?)
}

fn scope_for(channel_id: Option<i64>) -> MappingScope {
    match channel_id {
        Some(id) => MappingScope::Channel(id),
        None => MappingScope::Global,
    }
}

/// Execute one claimed relay command and produce its result value.
///
/// Mutating kinds invalidate the relevant cache side after the write, so
/// the message path picks the change up on its next read.
///
/// # Errors
/// Returns an error when the payload does not decode, validation fails, or
/// storage operations fail. The worker records the error as the command's
/// failure result.
pub fn execute(db: &Database, cache: &ReadCache, command: &RelayCommand) -> Result<Value, AppError> {
    match command.kind {
        CommandKind::AddMapping => {
            let payload: AddMappingPayload = decode_payload(&command.payload)?;
            let mapping = EmojiMapping::new(
                &payload.emoji,
                payload.custom_emoji_id,
                scope_for(payload.channel_id),
                payload.description,
            )?;
            db.mappings.upsert(&mapping)?;
            cache.invalidate_mappings()?;
            Ok(json!({
                "status": "ok",
                "emoji": mapping.emoji,
                "custom_emoji_id": mapping.custom_emoji_id,
                "scope": mapping.scope,
            }))
        }
        CommandKind::RemoveMapping => {
            let payload: RemoveMappingPayload = decode_payload(&command.payload)?;
            let removed = db
                .mappings
                .remove(payload.emoji.trim(), scope_for(payload.channel_id))?;
            cache.invalidate_mappings()?;
            Ok(json!({ "status": "ok", "removed": removed }))
        }
        CommandKind::AddChannel => {
            let payload: AddChannelPayload = decode_payload(&command.payload)?;
            let display_name = payload
                .display_name
                .unwrap_or_else(|| payload.channel_id.to_string());
            let channel = db.channels.upsert(payload.channel_id, &display_name)?;
            cache.invalidate_channels()?;
            Ok(json!({
                "status": "ok",
                "channel_id": channel.channel_id,
                "display_name": channel.display_name,
            }))
        }
        CommandKind::RemoveChannel => {
            let payload: RemoveChannelPayload = decode_payload(&command.payload)?;
            let removed = db.channels.deactivate(payload.channel_id)?;
            cache.invalidate_channels()?;
            Ok(json!({ "status": "ok", "removed": removed }))
        }
        CommandKind::ListMappings => {
            let mappings = db.mappings.list()?;
            Ok(json!({ "status": "ok", "mappings": mappings }))
        }
        CommandKind::ListChannels => {
            let channels = db.channels.list_active()?;
            Ok(json!({ "status": "ok", "channels": channels }))
        }
        CommandKind::GetStatus => {
            let relay = db.relay.count_by_state()?;
            Ok(json!({
                "status": "ok",
                "mappings": db.mappings.count()?,
                "active_channels": db.channels.count_active()?,
                "relay": relay,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emojirelay_core::models::command::CommandState;
    use tempfile::TempDir;

    fn setup() -> (Database, ReadCache, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let db = Database::new(temp_dir.path().to_str().expect("db path")).expect("db");
        let cache = ReadCache::new(db.share().expect("share db"));
        (db, cache, temp_dir)
    }

    fn command(kind: CommandKind, payload: Value) -> RelayCommand {
        RelayCommand::new(1, kind, payload, Some(42))
    }

    #[test]
    fn add_mapping_persists_and_invalidates_the_cache() {
        let (db, cache, _tmp) = setup();
        db.channels.upsert(-100123, "news").unwrap();
        // Warm both cache sides first.
        assert!(cache.mapping_snapshot(-100123).unwrap().is_empty());

        let result = execute(
            &db,
            &cache,
            &command(
                CommandKind::AddMapping,
                json!({ "emoji": "😀", "custom_emoji_id": 501 }),
            ),
        )
        .unwrap();
        assert_eq!(result["status"], "ok");

        // Stored globally and visible through the cache without manual
        // invalidation.
        let stored = db
            .mappings
            .get("😀", MappingScope::Global)
            .unwrap()
            .expect("stored mapping");
        assert_eq!(stored.custom_emoji_id, 501);
        let snapshot = cache.mapping_snapshot(-100123).unwrap();
        assert_eq!(snapshot.resolve("😀"), Some(501));
    }

    #[test]
    fn add_mapping_with_a_channel_id_is_channel_scoped() {
        let (db, cache, _tmp) = setup();
        execute(
            &db,
            &cache,
            &command(
                CommandKind::AddMapping,
                json!({ "emoji": "😀", "custom_emoji_id": 777, "channel_id": -100123 }),
            ),
        )
        .unwrap();
        assert!(db
            .mappings
            .get("😀", MappingScope::Channel(-100123))
            .unwrap()
            .is_some());
        assert!(db.mappings.get("😀", MappingScope::Global).unwrap().is_none());
    }

    #[test]
    fn invalid_mapping_payloads_fail_validation() {
        let (db, cache, _tmp) = setup();
        let err = execute(
            &db,
            &cache,
            &command(
                CommandKind::AddMapping,
                json!({ "emoji": "not-an-emoji", "custom_emoji_id": 501 }),
            ),
        )
        .expect_err("multi-cluster key");
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = execute(
            &db,
            &cache,
            &command(CommandKind::AddMapping, json!({ "emoji": "😀" })),
        )
        .expect_err("missing custom_emoji_id");
        assert!(matches!(err, AppError::Payload(_)));
    }

    #[test]
    fn remove_mapping_reports_whether_a_row_existed() {
        let (db, cache, _tmp) = setup();
        let mapping = EmojiMapping::new("😀", 501, MappingScope::Global, None).unwrap();
        db.mappings.upsert(&mapping).unwrap();

        let removed = execute(
            &db,
            &cache,
            &command(CommandKind::RemoveMapping, json!({ "emoji": "😀" })),
        )
        .unwrap();
        assert_eq!(removed["removed"], true);

        let absent = execute(
            &db,
            &cache,
            &command(CommandKind::RemoveMapping, json!({ "emoji": "😀" })),
        )
        .unwrap();
        assert_eq!(absent["removed"], false);
    }

    #[test]
    fn channel_lifecycle_through_commands() {
        let (db, cache, _tmp) = setup();
        assert!(!cache.is_watched(-100123).unwrap());

        execute(
            &db,
            &cache,
            &command(
                CommandKind::AddChannel,
                json!({ "channel_id": -100123, "display_name": "news" }),
            ),
        )
        .unwrap();
        assert!(cache.is_watched(-100123).unwrap());

        let listed = execute(&db, &cache, &command(CommandKind::ListChannels, json!(null))).unwrap();
        assert_eq!(listed["channels"].as_array().unwrap().len(), 1);

        execute(
            &db,
            &cache,
            &command(CommandKind::RemoveChannel, json!({ "channel_id": -100123 })),
        )
        .unwrap();
        assert!(!cache.is_watched(-100123).unwrap());
    }

    #[test]
    fn status_reports_counts_across_tables() {
        let (db, cache, _tmp) = setup();
        let mapping = EmojiMapping::new("😀", 501, MappingScope::Global, None).unwrap();
        db.mappings.upsert(&mapping).unwrap();
        db.channels.upsert(-1, "a").unwrap();
        db.relay
            .enqueue(CommandKind::GetStatus, json!(null), None)
            .unwrap();

        let status = execute(&db, &cache, &command(CommandKind::GetStatus, json!(null))).unwrap();
        assert_eq!(status["mappings"], 1);
        assert_eq!(status["active_channels"], 1);
        assert_eq!(status["relay"]["pending"], 1);

        // Sanity: the enqueued row really is pending.
        let stored = db.relay.get(1).unwrap().expect("row");
        assert_eq!(stored.state, CommandState::Pending);
    }
}
