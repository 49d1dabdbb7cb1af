// BackupService - exports every post to a JSON file once the collection grows past a threshold

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::BackupConfig;
use crate::ent_schema::Collection;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentQuery, DocumentStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    pub record_count: u64,
    pub threshold: u64,
    pub backup_needed: bool,
    pub records_until_backup: u64,
}

#[derive(Clone)]
pub struct BackupService {
    store: Arc<dyn DocumentStore>,
    threshold: u64,
    directory: PathBuf,
}

impl BackupService {
    pub fn new(store: Arc<dyn DocumentStore>, config: &BackupConfig) -> Self {
        Self {
            store,
            threshold: config.threshold,
            directory: PathBuf::from(&config.directory),
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub async fn record_count(&self) -> AppResult<u64> {
        self.store.count(Collection::Posts, &DocumentQuery::new()).await
    }

    pub async fn is_backup_needed(&self) -> AppResult<bool> {
        let count = self.record_count().await?;
        let needed = count >= self.threshold;
        if needed {
            warn!("Post count {} reached backup threshold {}", count, self.threshold);
        }
        Ok(needed)
    }

    pub async fn status(&self) -> AppResult<BackupStatus> {
        let record_count = self.record_count().await?;
        Ok(BackupStatus {
            record_count,
            threshold: self.threshold,
            backup_needed: record_count >= self.threshold,
            records_until_backup: self.threshold.saturating_sub(record_count),
        })
    }

    /// Write all posts, oldest first, as pretty JSON. Returns the file's absolute path.
    pub async fn perform_backup(&self) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.directory).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create backup directory {}: {}",
                self.directory.display(),
                e
            ))
        })?;

        let posts = self
            .store
            .find(Collection::Posts, &DocumentQuery::new().sort_asc("created_at"))
            .await?;

        let file_name = format!(
            "blog_posts_backup_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let path = self.directory.join(file_name);
        tokio::fs::write(&path, serde_json::to_vec_pretty(&posts)?)
            .await
            .map_err(|e| {
                AppError::Internal(format!("Failed to write backup {}: {}", path.display(), e))
            })?;

        let path = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        info!("Backed up {} posts to {}", posts.len(), path.display());
        Ok(path)
    }

    /// Back up when the threshold is reached. `Ok(None)` when no backup was needed.
    pub async fn backup_if_needed(&self) -> AppResult<Option<PathBuf>> {
        if !self.is_backup_needed().await? {
            debug!("No backup needed");
            return Ok(None);
        }
        self.perform_backup().await.map(Some)
    }
}

/// Periodically runs `backup_if_needed` until shut down
pub struct BackupScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl BackupScheduler {
    pub fn start(service: BackupService, interval: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = service.backup_if_needed().await {
                            error!("Scheduled backup failed: {}", e);
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("Backup scheduler stopping");
                            break;
                        }
                    }
                }
            }
        });

        info!("Backup scheduler started, interval {:?}", interval);
        Self { shutdown, handle }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("Backup scheduler task ended abnormally: {}", e);
        }
    }
}
