// TagService - tags and the post <-> tag relation

use std::sync::Arc;
use tracing::{debug, info};

use crate::core::strong_types::DocumentId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentQuery, DocumentStore, Update};
use crate::models::{Post, Repository, Tag};

#[derive(Clone)]
pub struct TagService {
    tags: Repository<Tag>,
    posts: Repository<Post>,
}

impl TagService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            tags: Repository::new(Arc::clone(&store)),
            posts: Repository::new(store),
        }
    }

    /// Create a tag. Names are unique; a duplicate is `AppError::AlreadyExists`.
    pub async fn create(&self, name: &str) -> AppResult<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Tag name must not be empty".to_string()));
        }

        let tag = Tag::new(name);
        self.tags.insert(&tag).await?;
        info!("Created tag '{}' ({})", tag.name, tag.id);
        Ok(tag)
    }

    /// Existing tag with this name, or a new one. Safe against concurrent creation.
    pub async fn get_or_create(&self, name: &str) -> AppResult<Tag> {
        if let Some(tag) = self.find_by_name(name).await? {
            return Ok(tag);
        }

        match self.create(name).await {
            Err(AppError::AlreadyExists(_)) => self
                .find_by_name(name)
                .await?
                .ok_or_else(|| AppError::Internal(format!("Tag '{}' vanished after conflict", name))),
            other => other,
        }
    }

    pub async fn get(&self, id: &DocumentId) -> AppResult<Tag> {
        self.tags.require(id).await
    }

    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Tag>> {
        self.tags
            .find_one(DocumentQuery::new().eq_ignore_case("name", name.trim()))
            .await
    }

    /// Link a tag and a post on both sides. Re-tagging is a no-op.
    pub async fn tag_post(&self, tag_id: &DocumentId, post_id: &DocumentId) -> AppResult<()> {
        let tag = self.tags.require(tag_id).await?;
        let post = self.posts.require(post_id).await?;

        if !post.tag_ids.contains(tag_id) {
            self.posts
                .update(post_id, &[Update::push("tag_ids", tag_id.as_str()), Update::touch()])
                .await?;
        }
        if !tag.post_ids.contains(post_id) {
            self.tags
                .update(
                    tag_id,
                    &[Update::push("post_ids", post_id.as_str()), Update::inc("post_count", 1)],
                )
                .await?;
        }

        debug!("Tagged post {} with '{}'", post_id, tag.name);
        Ok(())
    }

    /// Remove a tag from a post on both sides
    pub async fn untag_post(&self, tag_id: &DocumentId, post_id: &DocumentId) -> AppResult<()> {
        let tag = self.tags.require(tag_id).await?;

        self.posts
            .update(post_id, &[Update::pull("tag_ids", tag_id.as_str()), Update::touch()])
            .await?;
        if tag.post_ids.contains(post_id) {
            self.tags
                .update(
                    tag_id,
                    &[Update::pull("post_ids", post_id.as_str()), Update::dec("post_count", 1)],
                )
                .await?;
        }
        Ok(())
    }

    pub async fn popular(&self, limit: u64) -> AppResult<Vec<Tag>> {
        self.tags
            .find(&DocumentQuery::new().sort_desc("post_count").limit(limit))
            .await
    }

    pub async fn tags_for_post(&self, post_id: &DocumentId) -> AppResult<Vec<Tag>> {
        self.tags
            .find(&DocumentQuery::new().contains("post_ids", post_id.as_str()).sort_asc("name"))
            .await
    }
}
