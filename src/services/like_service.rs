// LikeService - one like per (user, post), enforced by the unique index

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::strong_types::{DocumentId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentQuery, DocumentStore, Update};
use crate::models::{Like, LikeOutcome, Post, Repository};

#[derive(Clone)]
pub struct LikeService {
    likes: Repository<Like>,
    posts: Repository<Post>,
}

impl LikeService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            likes: Repository::new(Arc::clone(&store)),
            posts: Repository::new(store),
        }
    }

    /// Like a post. Concurrent duplicates race in the store; exactly one wins.
    pub async fn like(&self, user_id: UserId, post_id: &DocumentId) -> AppResult<LikeOutcome> {
        self.posts.require(post_id).await?;

        let like = Like::new(user_id, post_id.clone());
        match self.likes.insert(&like).await {
            Ok(_) => {}
            Err(AppError::AlreadyExists(_)) => {
                debug!("User {} already liked post {}", user_id, post_id);
                return Ok(LikeOutcome::AlreadyLiked);
            }
            Err(e) => return Err(e),
        }

        let counted = self
            .posts
            .update(
                post_id,
                &[Update::push("like_ids", like.id.as_str()), Update::inc("like_count", 1)],
            )
            .await;
        let failure = match counted {
            Ok(Some(_)) => None,
            Ok(None) => Some(AppError::NotFound(format!("Post not found with id: {}", post_id))),
            Err(e) => Some(e),
        };
        if let Some(err) = failure {
            // The like must not outlive a failed counter update
            if let Err(e) = self.likes.delete(&like.id).await {
                warn!("Failed to remove like {} after error: {}", like.id, e);
            }
            return Err(err);
        }

        info!("User {} liked post {}", user_id, post_id);
        Ok(LikeOutcome::Liked(like))
    }

    /// Remove a like. Returns false when the user had not liked the post.
    pub async fn unlike(&self, user_id: UserId, post_id: &DocumentId) -> AppResult<bool> {
        let Some(like) = self.find(user_id, post_id).await? else {
            return Ok(false);
        };

        if !self.likes.delete(&like.id).await? {
            return Ok(false);
        }
        self.posts
            .update(
                post_id,
                &[Update::pull("like_ids", like.id.as_str()), Update::dec("like_count", 1)],
            )
            .await?;

        info!("User {} unliked post {}", user_id, post_id);
        Ok(true)
    }

    pub async fn has_liked(&self, user_id: UserId, post_id: &DocumentId) -> AppResult<bool> {
        Ok(self.find(user_id, post_id).await?.is_some())
    }

    async fn find(&self, user_id: UserId, post_id: &DocumentId) -> AppResult<Option<Like>> {
        self.likes
            .find_one(
                DocumentQuery::new()
                    .eq("user_id", user_id.value())
                    .eq("post_id", post_id.as_str()),
            )
            .await
    }

    pub async fn likes_for_post(&self, post_id: &DocumentId) -> AppResult<Vec<Like>> {
        self.likes
            .find(&DocumentQuery::new().eq("post_id", post_id.as_str()).sort_desc("created_at"))
            .await
    }

    pub async fn count_for_post(&self, post_id: &DocumentId) -> AppResult<u64> {
        self.likes
            .count(&DocumentQuery::new().eq("post_id", post_id.as_str()))
            .await
    }

    pub async fn likes_by_user(&self, user_id: UserId) -> AppResult<Vec<Like>> {
        self.likes
            .find(&DocumentQuery::new().eq("user_id", user_id.value()).sort_desc("created_at"))
            .await
    }
}
