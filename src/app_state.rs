use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{database::DocumentStore, sqlite_database::SqliteDocumentStore},
    schemas::create_schema_registry,
    services::{
        BackupService, BlogQueryService, CategoryService, CommentService, LikeService, NotificationService,
        PostService, TagService,
    },
};

/// Shared handles to the store and every service
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub categories: CategoryService,
    pub tags: TagService,
    pub posts: PostService,
    pub comments: CommentService,
    pub likes: LikeService,
    pub notifications: NotificationService,
    pub blogs: BlogQueryService,
    pub backups: BackupService,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let store = SqliteDocumentStore::connect(
            &config.database.url,
            config.database.max_connections,
            create_schema_registry(),
        )
        .await?;
        Ok(Self::from_store(Arc::new(store), config))
    }

    pub fn from_store(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        Self {
            categories: CategoryService::new(Arc::clone(&store)),
            tags: TagService::new(Arc::clone(&store)),
            posts: PostService::new(Arc::clone(&store)),
            comments: CommentService::new(Arc::clone(&store)),
            likes: LikeService::new(Arc::clone(&store)),
            notifications: NotificationService::new(Arc::clone(&store)),
            blogs: BlogQueryService::new(Arc::clone(&store), config.cache.capacity),
            backups: BackupService::new(Arc::clone(&store), &config.backup),
            store,
            config,
        }
    }

    /// Fresh in-memory state, for tests and demos
    pub async fn in_memory() -> AppResult<Self> {
        Self::new(Config::in_memory()).await
    }
}
