//! Watcher entrypoint.

use emojirelay_core::db::ReadCache;
use emojirelay_watcher::{Config, Database, RelayWorker};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emojirelay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(db_path = %config.db_path, "opening relay database");
    let database = Database::new(&config.db_path)?;

    let cache = Arc::new(ReadCache::new(database.share()?));
    let worker = RelayWorker::new(database.share()?, cache, config);
    tracing::info!(worker_id = %worker.worker_id(), "emojirelay watcher running");

    worker.run(shutdown_signal()).await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
