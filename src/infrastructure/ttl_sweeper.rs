// TTL Sweeper - background task removing documents past their index TTL

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::AppResult;
use crate::infrastructure::database::DocumentStore;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepStats {
    pub sweeps: u64,
    pub documents_purged: u64,
    pub failures: u64,
}

/// Periodically calls `purge_expired` on the store until shut down
pub struct TtlSweeper {
    stats: Arc<RwLock<SweepStats>>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TtlSweeper {
    pub fn start(store: Arc<dyn DocumentStore>, interval: Duration) -> Self {
        let stats = Arc::new(RwLock::new(SweepStats::default()));
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let worker_stats = Arc::clone(&stats);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let result = sweep_once(store.as_ref()).await;
                        let mut stats = worker_stats.write().await;
                        stats.sweeps += 1;
                        match result {
                            Ok(purged) => stats.documents_purged += purged,
                            Err(e) => {
                                error!("TTL sweep failed: {}", e);
                                stats.failures += 1;
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("TTL sweeper stopping");
                            break;
                        }
                    }
                }
            }
        });

        info!("TTL sweeper started, interval {:?}", interval);
        Self {
            stats,
            shutdown,
            handle,
        }
    }

    pub async fn stats(&self) -> SweepStats {
        self.stats.read().await.clone()
    }

    /// Signal the worker and wait for it to finish its current sweep
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("TTL sweeper task ended abnormally: {}", e);
        }
    }
}

/// Run a single purge pass at the current time
pub async fn sweep_once(store: &dyn DocumentStore) -> AppResult<u64> {
    let purged = store.purge_expired(Utc::now()).await?;
    if purged > 0 {
        info!("TTL sweep removed {} documents", purged);
    }
    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ent_schema::Collection;
    use crate::infrastructure::sqlite_database::SqliteDocumentStore;
    use serde_json::json;

    fn notification(id: &str, created_at: i64) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": 1,
            "message": "You have a new follower",
            "notification_type": "FOLLOW",
            "is_read": false,
            "created_at": created_at
        })
    }

    #[tokio::test]
    async fn test_sweeper_purges_and_stops() {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::in_memory().await.unwrap());
        let old = (Utc::now() - chrono::Duration::days(91)).timestamp_millis();
        store.insert(Collection::Notifications, notification("old", old)).await.unwrap();
        store
            .insert(Collection::Notifications, notification("new", Utc::now().timestamp_millis()))
            .await
            .unwrap();

        let sweeper = TtlSweeper::start(Arc::clone(&store), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let stats = sweeper.stats().await;
        assert!(stats.sweeps >= 1);
        assert_eq!(stats.documents_purged, 1);
        assert_eq!(stats.failures, 0);
        sweeper.shutdown().await;

        let remaining = store
            .find(Collection::Notifications, &Default::default())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["id"], "new");
    }
}
