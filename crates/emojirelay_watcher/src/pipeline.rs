//! Inbound message rewrite pipeline.
//!
//! New and edited messages flow through the same path: watch-set gate,
//! symbol scan, plan against a mapping snapshot, rewrite, then a single
//! platform edit carrying the full rewritten document.

use crate::error::{PlatformError, WatcherError};
use crate::platform::{InboundMessage, PlatformClient};
use emojirelay_core::db::ReadCache;
use emojirelay_core::plan::plan;
use emojirelay_core::rewrite::apply;
use emojirelay_core::scan::scan;
use emojirelay_core::{Config, Document};

/// What the pipeline did with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// Channel is not in the watch set; the message was ignored.
    NotWatched,
    /// Nothing to rewrite; no platform edit was issued.
    Unchanged,
    /// The message was edited with this many replacements.
    Edited { replacements: usize },
}

/// Process one inbound message end to end.
///
/// The mapping snapshot is taken once up front; mapping changes landing
/// mid-message apply from the next message on.
///
/// # Errors
/// Returns storage errors from the cache reads, `PlanInvariantViolation`
/// style failures from the rewrite, and platform errors once retries for
/// rate limiting are exhausted.
pub async fn handle_inbound<C: PlatformClient>(
    cache: &ReadCache,
    config: &Config,
    client: &C,
    message: &InboundMessage,
) -> Result<RewriteOutcome, WatcherError> {
    if !cache.is_watched(message.channel_id)? {
        return Ok(RewriteOutcome::NotWatched);
    }

    let clusters = scan(&message.text);
    if clusters.is_empty() {
        return Ok(RewriteOutcome::Unchanged);
    }

    let snapshot = cache.mapping_snapshot(message.channel_id)?;
    if snapshot.is_empty() {
        return Ok(RewriteOutcome::Unchanged);
    }

    let document = Document::new(message.text.clone(), message.ranges.clone())
        .map_err(WatcherError::Storage)?;
    let computed = plan(&document, &clusters, &snapshot, &config.placeholder);
    if computed.is_empty() {
        return Ok(RewriteOutcome::Unchanged);
    }

    let rewritten = apply(&document, &computed).map_err(WatcherError::Storage)?;
    let replacements = computed.entries().len();
    edit_with_retry(client, config, message, &rewritten).await?;

    tracing::info!(
        channel_id = message.channel_id,
        message_id = message.message_id,
        replacements,
        edited = message.edited,
        "rewrote message"
    );
    Ok(RewriteOutcome::Edited { replacements })
}

/// Issue the platform edit, retrying only on rate limiting.
///
/// Rejections and transport failures propagate immediately; a rewrite is
/// never retried past `max_edit_retries` back-offs.
async fn edit_with_retry<C: PlatformClient>(
    client: &C,
    config: &Config,
    message: &InboundMessage,
    document: &Document,
) -> Result<(), PlatformError> {
    let mut attempts = 0u32;
    loop {
        match client
            .edit_message(message.channel_id, message.message_id, document)
            .await
        {
            Ok(()) => return Ok(()),
            Err(PlatformError::RateLimited { retry_after })
                if attempts < config.max_edit_retries =>
            {
                attempts += 1;
                tracing::warn!(
                    channel_id = message.channel_id,
                    message_id = message.message_id,
                    attempt = attempts,
                    ?retry_after,
                    "rate limited, backing off"
                );
                tokio::time::sleep(retry_after).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emojirelay_core::models::mapping::{EmojiMapping, MappingScope};
    use emojirelay_core::plan::PlaceholderPolicy;
    use emojirelay_core::{Database, StyleKind, StyleRange};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Fake platform that records edits and plays back scripted failures.
    #[derive(Default)]
    struct RecordingClient {
        edits: Mutex<Vec<(i64, i64, Document)>>,
        failures: Mutex<Vec<PlatformError>>,
    }

    impl RecordingClient {
        fn fail_next(&self, err: PlatformError) {
            self.failures.lock().unwrap().push(err);
        }

        fn recorded(&self) -> Vec<(i64, i64, Document)> {
            self.edits.lock().unwrap().clone()
        }
    }

    impl PlatformClient for RecordingClient {
        async fn edit_message(
            &self,
            channel_id: i64,
            message_id: i64,
            document: &Document,
        ) -> Result<(), PlatformError> {
            if let Some(err) = self.failures.lock().unwrap().pop() {
                return Err(err);
            }
            self.edits
                .lock()
                .unwrap()
                .push((channel_id, message_id, document.clone()));
            Ok(())
        }
    }

    fn test_config() -> Config {
        Config {
            db_path: String::new(),
            poll_interval_ms: 10,
            claim_staleness_secs: 60,
            tick_deadline_ms: 1_000,
            max_edit_retries: 3,
            placeholder: PlaceholderPolicy::RetainOriginal,
        }
    }

    fn setup() -> (Database, ReadCache, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let db = Database::new(temp_dir.path().to_str().expect("db path")).expect("db");
        let cache = ReadCache::new(db.share().expect("share db"));
        (db, cache, temp_dir)
    }

    fn message(channel_id: i64, text: &str, ranges: Vec<StyleRange>) -> InboundMessage {
        InboundMessage {
            channel_id,
            message_id: 9001,
            text: text.to_string(),
            ranges,
            edited: false,
        }
    }

    #[tokio::test]
    async fn watched_message_is_rewritten_and_edited_once() {
        let (db, cache, _tmp) = setup();
        db.channels.upsert(-100123, "news").unwrap();
        let mapping = EmojiMapping::new("😀", 501, MappingScope::Global, None).unwrap();
        db.mappings.upsert(&mapping).unwrap();

        let client = RecordingClient::default();
        let msg = message(
            -100123,
            "hi 😀 world",
            vec![StyleRange::new(StyleKind::Bold, 6, 11)],
        );
        let outcome = handle_inbound(&cache, &test_config(), &client, &msg)
            .await
            .unwrap();
        assert_eq!(outcome, RewriteOutcome::Edited { replacements: 1 });

        let edits = client.recorded();
        assert_eq!(edits.len(), 1);
        let (channel_id, message_id, document) = &edits[0];
        assert_eq!((*channel_id, *message_id), (-100123, 9001));
        assert_eq!(document.text(), "hi 😀 world");
        assert_eq!(
            document.ranges(),
            &[
                StyleRange::new(StyleKind::CustomEmoji { id: 501 }, 3, 5),
                StyleRange::new(StyleKind::Bold, 6, 11),
            ]
        );
    }

    #[tokio::test]
    async fn unwatched_channels_are_ignored() {
        let (db, cache, _tmp) = setup();
        let mapping = EmojiMapping::new("😀", 501, MappingScope::Global, None).unwrap();
        db.mappings.upsert(&mapping).unwrap();

        let client = RecordingClient::default();
        let msg = message(-100999, "hi 😀", Vec::new());
        let outcome = handle_inbound(&cache, &test_config(), &client, &msg)
            .await
            .unwrap();
        assert_eq!(outcome, RewriteOutcome::NotWatched);
        assert!(client.recorded().is_empty());
    }

    #[tokio::test]
    async fn unmapped_symbols_leave_the_message_untouched() {
        let (db, cache, _tmp) = setup();
        db.channels.upsert(-100123, "news").unwrap();
        let mapping = EmojiMapping::new("😀", 501, MappingScope::Global, None).unwrap();
        db.mappings.upsert(&mapping).unwrap();

        let client = RecordingClient::default();
        let msg = message(-100123, "only 🔥 here", Vec::new());
        let outcome = handle_inbound(&cache, &test_config(), &client, &msg)
            .await
            .unwrap();
        assert_eq!(outcome, RewriteOutcome::Unchanged);
        assert!(client.recorded().is_empty());
    }

    #[tokio::test]
    async fn plain_text_short_circuits_before_snapshot_reads() {
        let (db, cache, _tmp) = setup();
        db.channels.upsert(-100123, "news").unwrap();

        let client = RecordingClient::default();
        let msg = message(-100123, "no symbols here", Vec::new());
        let outcome = handle_inbound(&cache, &test_config(), &client, &msg)
            .await
            .unwrap();
        assert_eq!(outcome, RewriteOutcome::Unchanged);
        assert!(client.recorded().is_empty());
    }

    #[tokio::test]
    async fn rate_limited_edits_are_retried() {
        let (db, cache, _tmp) = setup();
        db.channels.upsert(-100123, "news").unwrap();
        let mapping = EmojiMapping::new("😀", 501, MappingScope::Global, None).unwrap();
        db.mappings.upsert(&mapping).unwrap();

        let client = RecordingClient::default();
        client.fail_next(PlatformError::RateLimited {
            retry_after: Duration::from_millis(1),
        });

        let msg = message(-100123, "😀", Vec::new());
        let outcome = handle_inbound(&cache, &test_config(), &client, &msg)
            .await
            .unwrap();
        assert_eq!(outcome, RewriteOutcome::Edited { replacements: 1 });
        assert_eq!(client.recorded().len(), 1);
    }

    #[tokio::test]
    async fn rejected_edits_propagate_without_retry() {
        let (db, cache, _tmp) = setup();
        db.channels.upsert(-100123, "news").unwrap();
        let mapping = EmojiMapping::new("😀", 501, MappingScope::Global, None).unwrap();
        db.mappings.upsert(&mapping).unwrap();

        let client = RecordingClient::default();
        client.fail_next(PlatformError::Rejected("message deleted".to_string()));

        let msg = message(-100123, "😀", Vec::new());
        let err = handle_inbound(&cache, &test_config(), &client, &msg)
            .await
            .expect_err("rejection should propagate");
        assert!(matches!(
            err,
            WatcherError::Platform(PlatformError::Rejected(_))
        ));
        assert!(client.recorded().is_empty());
    }
}
