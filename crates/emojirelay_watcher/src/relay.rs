//! Relay worker poll loop.
//!
//! The watcher polls the durable relay on a fixed interval, claims at most
//! one command per tick, executes it, and records the outcome. The
//! claim-execute-complete body is synchronous storage work, so it runs on
//! the blocking pool; a tick that outlives its deadline is abandoned and
//! the claim expires through the staleness threshold, after which the
//! command is redelivered.

use crate::executor;
use emojirelay_core::db::ReadCache;
use emojirelay_core::{AppError, Config, Database};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Watcher-side relay consumer.
pub struct RelayWorker {
    db: Arc<Database>,
    cache: Arc<ReadCache>,
    config: Config,
    worker_id: String,
}

impl RelayWorker {
    pub fn new(db: Database, cache: Arc<ReadCache>, config: Config) -> Self {
        Self {
            db: Arc::new(db),
            cache,
            config,
            worker_id: format!("watcher-{}", Uuid::new_v4()),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Run the poll loop until `shutdown` resolves.
    ///
    /// Storage errors are logged and retried on the next tick; they never
    /// stop the loop.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        tracing::info!(
            worker_id = %self.worker_id,
            poll_interval_ms = self.config.poll_interval_ms,
            "relay worker started"
        );

        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(worker_id = %self.worker_id, "relay worker stopping");
                    break;
                }
                _ = interval.tick() => {
                    match tokio::time::timeout(self.config.tick_deadline(), self.tick()).await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            tracing::error!(worker_id = %self.worker_id, error = %err, "relay tick failed");
                        }
                        Err(_) => {
                            tracing::warn!(
                                worker_id = %self.worker_id,
                                deadline_ms = self.config.tick_deadline_ms,
                                "relay tick exceeded its deadline; claim left to expire"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Claim and execute at most one command on the blocking pool.
    ///
    /// redb calls are synchronous; running them off the runtime keeps the
    /// tick deadline and the shutdown branch responsive even when storage
    /// stalls.
    async fn tick(&self) -> Result<(), AppError> {
        let db = self.db.clone();
        let cache = self.cache.clone();
        let worker_id = self.worker_id.clone();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || run_tick(&db, &cache, &worker_id, &config))
            .await
            .map_err(|err| AppError::StorageMessage(format!("relay tick task failed: {}", err)))?
    }
}

fn run_tick(
    db: &Database,
    cache: &ReadCache,
    worker_id: &str,
    config: &Config,
) -> Result<(), AppError> {
    #[cfg(test)]
    if let Some(pause) = *tick_pause_slot().lock().expect("tick pause lock") {
        std::thread::sleep(pause);
    }

    let Some(command) = db.relay.claim_next(worker_id, config.claim_staleness())? else {
        return Ok(());
    };

    tracing::info!(
        worker_id,
        id = command.id,
        kind = ?command.kind,
        "executing relay command"
    );

    let finish = match executor::execute(db, cache, &command) {
        Ok(result) => db.relay.complete(command.id, worker_id, result),
        Err(err) => {
            tracing::warn!(id = command.id, error = %err, "relay command failed");
            db.relay.fail(command.id, worker_id, &err.to_string())
        }
    };

    match finish {
        // Our claim went stale mid-execution and another worker took
        // over; the command is theirs now.
        Err(AppError::ClaimMismatch) => {
            tracing::warn!(worker_id, id = command.id, "claim lost before completion");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
fn tick_pause_slot() -> &'static std::sync::Mutex<Option<std::time::Duration>> {
    static SLOT: std::sync::OnceLock<std::sync::Mutex<Option<std::time::Duration>>> =
        std::sync::OnceLock::new();
    SLOT.get_or_init(|| std::sync::Mutex::new(None))
}

/// Stall the start of every tick body; `None` clears the stall.
#[cfg(test)]
fn set_tick_pause(pause: Option<std::time::Duration>) {
    *tick_pause_slot().lock().expect("tick pause lock") = pause;
}
