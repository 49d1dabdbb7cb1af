// PostService - post lifecycle and the denormalized caches around posts
// Counter and back-reference arrays are kept in step by single-document updates;
// the reconcile operations recompute them from the source collections.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::strong_types::{DocumentId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentQuery, DocumentStore, Update};
use crate::models::{
    Category, Comment, Like, NewPost, PageRequest, PagedResponse, Post, Repository, Tag,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub posts_checked: u64,
    pub posts_repaired: u64,
    pub categories_checked: u64,
    pub categories_repaired: u64,
    pub tags_checked: u64,
    pub tags_repaired: u64,
}

#[derive(Clone)]
pub struct PostService {
    posts: Repository<Post>,
    categories: Repository<Category>,
    tags: Repository<Tag>,
    comments: Repository<Comment>,
    likes: Repository<Like>,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            posts: Repository::new(Arc::clone(&store)),
            categories: Repository::new(Arc::clone(&store)),
            tags: Repository::new(Arc::clone(&store)),
            comments: Repository::new(Arc::clone(&store)),
            likes: Repository::new(store),
        }
    }

    /// Create a post in an existing category and link it from the category and its tags
    pub async fn create(&self, input: NewPost) -> AppResult<Post> {
        if self.categories.get(&input.category_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Category does not exist: {}",
                input.category_id
            )));
        }
        for tag_id in &input.tag_ids {
            if self.tags.get(tag_id).await?.is_none() {
                return Err(AppError::Validation(format!("Tag does not exist: {}", tag_id)));
            }
        }

        let mut post = Post::new(input);
        let mut seen = HashSet::new();
        post.tag_ids.retain(|tag_id| seen.insert(tag_id.clone()));
        let outcome = self.posts.insert(&post).await?;
        if outcome.is_flagged() {
            warn!("Post {} stored with {} violations", post.id, outcome.violations.len());
        }

        self.categories
            .update(
                &post.category_id,
                &[Update::push("post_ids", post.id.as_str()), Update::inc("post_count", 1)],
            )
            .await?;
        for tag_id in &post.tag_ids {
            self.tags
                .update(
                    tag_id,
                    &[Update::push("post_ids", post.id.as_str()), Update::inc("post_count", 1)],
                )
                .await?;
        }

        info!("Created post {} '{}' by {}", post.id, post.title, post.author_id);
        Ok(post)
    }

    pub async fn get(&self, id: &DocumentId) -> AppResult<Post> {
        self.posts.require(id).await
    }

    pub async fn find(&self, id: &DocumentId) -> AppResult<Option<Post>> {
        self.posts.get(id).await
    }

    pub async fn publish(&self, id: &DocumentId) -> AppResult<Post> {
        self.set_published(id, true).await
    }

    pub async fn unpublish(&self, id: &DocumentId) -> AppResult<Post> {
        self.set_published(id, false).await
    }

    async fn set_published(&self, id: &DocumentId, published: bool) -> AppResult<Post> {
        let post = self
            .posts
            .modify(id, &[Update::set("is_published", published), Update::touch()])
            .await?;
        info!("Post {} published={}", id, published);
        Ok(post)
    }

    pub async fn record_view(&self, id: &DocumentId) -> AppResult<()> {
        self.posts
            .update(id, &[Update::inc("view_count", 1)])
            .await?
            .ok_or_else(|| AppError::NotFound(format!("posts not found with id: {}", id)))?;
        Ok(())
    }

    /// Delete a post with its comments and likes, detaching it from category and tags
    pub async fn delete(&self, id: &DocumentId) -> AppResult<bool> {
        let Some(post) = self.posts.get(id).await? else {
            return Ok(false);
        };

        let comments = self
            .comments
            .delete_matching(&DocumentQuery::new().eq("post_id", id.as_str()))
            .await?;
        let likes = self
            .likes
            .delete_matching(&DocumentQuery::new().eq("post_id", id.as_str()))
            .await?;

        self.categories
            .update(
                &post.category_id,
                &[Update::pull("post_ids", id.as_str()), Update::dec("post_count", 1)],
            )
            .await?;
        for tag_id in &post.tag_ids {
            self.tags
                .update(
                    tag_id,
                    &[Update::pull("post_ids", id.as_str()), Update::dec("post_count", 1)],
                )
                .await?;
        }

        let deleted = self.posts.delete(id).await?;
        info!(
            "Deleted post {} with {} comments and {} likes",
            id, comments, likes
        );
        Ok(deleted)
    }

    /// Most viewed published posts
    pub async fn popular(&self, limit: u64) -> AppResult<Vec<Post>> {
        self.posts
            .find(
                &DocumentQuery::new()
                    .eq("is_published", true)
                    .sort_desc("view_count")
                    .limit(limit),
            )
            .await
    }

    /// Every post by an author, drafts included, newest first
    pub async fn by_author(&self, author_id: UserId, page: PageRequest) -> AppResult<PagedResponse<Post>> {
        self.posts
            .page(
                DocumentQuery::new()
                    .eq("author_id", author_id.value())
                    .sort_desc("created_at"),
                page,
            )
            .await
    }

    /// Recompute a post's like and comment caches. Returns true when they had drifted.
    pub async fn reconcile_post_counters(&self, id: &DocumentId) -> AppResult<bool> {
        let post = self.posts.require(id).await?;

        let like_ids: Vec<String> = self
            .likes
            .find(&DocumentQuery::new().eq("post_id", id.as_str()).sort_asc("created_at"))
            .await?
            .into_iter()
            .map(|like| like.id.into_string())
            .collect();
        let comment_ids: Vec<String> = self
            .comments
            .find(
                &DocumentQuery::new()
                    .eq("post_id", id.as_str())
                    .eq("is_active", true)
                    .sort_asc("created_at"),
            )
            .await?
            .into_iter()
            .map(|comment| comment.id.into_string())
            .collect();

        let in_step = post.like_count == like_ids.len() as i64
            && post.comment_count == comment_ids.len() as i64
            && same_members(&post.like_ids, &like_ids)
            && same_members(&post.comment_ids, &comment_ids);
        if in_step {
            return Ok(false);
        }

        warn!(
            "Post {} counters drifted: likes {} -> {}, comments {} -> {}",
            id,
            post.like_count,
            like_ids.len(),
            post.comment_count,
            comment_ids.len()
        );
        self.posts
            .update(
                id,
                &[
                    Update::set("like_count", like_ids.len() as i64),
                    Update::set("like_ids", like_ids),
                    Update::set("comment_count", comment_ids.len() as i64),
                    Update::set("comment_ids", comment_ids),
                ],
            )
            .await?;
        Ok(true)
    }

    /// Recompute a category's post list and count. Returns true when they had drifted.
    pub async fn reconcile_category_counters(&self, id: &DocumentId) -> AppResult<bool> {
        let category = self.categories.require(id).await?;

        let post_ids: Vec<String> = self
            .posts
            .find(&DocumentQuery::new().eq("category_id", id.as_str()).sort_asc("created_at"))
            .await?
            .into_iter()
            .map(|post| post.id.into_string())
            .collect();

        if category.post_count == post_ids.len() as i64 && same_members(&category.post_ids, &post_ids) {
            return Ok(false);
        }

        warn!(
            "Category '{}' post count drifted: {} -> {}",
            category.name,
            category.post_count,
            post_ids.len()
        );
        self.categories
            .update(
                id,
                &[
                    Update::set("post_count", post_ids.len() as i64),
                    Update::set("post_ids", post_ids),
                ],
            )
            .await?;
        Ok(true)
    }

    /// Recompute a tag's post list and count. Returns true when they had drifted.
    pub async fn reconcile_tag_counters(&self, id: &DocumentId) -> AppResult<bool> {
        let tag = self.tags.require(id).await?;

        let post_ids: Vec<String> = self
            .posts
            .find(&DocumentQuery::new().contains("tag_ids", id.as_str()).sort_asc("created_at"))
            .await?
            .into_iter()
            .map(|post| post.id.into_string())
            .collect();

        if tag.post_count == post_ids.len() as i64 && same_members(&tag.post_ids, &post_ids) {
            return Ok(false);
        }

        warn!(
            "Tag '{}' post count drifted: {} -> {}",
            tag.name,
            tag.post_count,
            post_ids.len()
        );
        self.tags
            .update(
                id,
                &[
                    Update::set("post_count", post_ids.len() as i64),
                    Update::set("post_ids", post_ids),
                ],
            )
            .await?;
        Ok(true)
    }

    /// Reconcile every post, category and tag
    pub async fn reconcile_all(&self) -> AppResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for post in self.posts.find(&DocumentQuery::new()).await? {
            report.posts_checked += 1;
            if self.reconcile_post_counters(&post.id).await? {
                report.posts_repaired += 1;
            }
        }
        for category in self.categories.find(&DocumentQuery::new()).await? {
            report.categories_checked += 1;
            if self.reconcile_category_counters(&category.id).await? {
                report.categories_repaired += 1;
            }
        }
        for tag in self.tags.find(&DocumentQuery::new()).await? {
            report.tags_checked += 1;
            if self.reconcile_tag_counters(&tag.id).await? {
                report.tags_repaired += 1;
            }
        }

        info!("Reconciliation finished: {:?}", report);
        Ok(report)
    }
}

fn same_members(cached: &[DocumentId], actual: &[String]) -> bool {
    cached.len() == actual.len() && actual.iter().all(|id| cached.iter().any(|c| c.as_str() == id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDocumentStore;
    use crate::services::CategoryService;

    async fn setup() -> (Arc<dyn DocumentStore>, PostService, Category) {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::in_memory().await.unwrap());
        let category = CategoryService::new(Arc::clone(&store))
            .create("Technology and Innovation", None)
            .await
            .unwrap();
        (Arc::clone(&store), PostService::new(store), category)
    }

    fn new_post(category_id: &DocumentId) -> NewPost {
        NewPost {
            title: "Getting Started with Rust Lifetimes".to_string(),
            content: "Lifetimes describe how long references are valid.".to_string(),
            category_id: category_id.clone(),
            author_id: UserId(42),
            author_name: "Grace".to_string(),
            tag_ids: Vec::new(),
            publish: true,
        }
    }

    #[tokio::test]
    async fn test_create_links_category() {
        let (_, service, category) = setup().await;
        let post = service.create(new_post(&category.id)).await.unwrap();

        let category = service.categories.require(&category.id).await.unwrap();
        assert_eq!(category.post_count, 1);
        assert_eq!(category.post_ids, vec![post.id.clone()]);
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let (_, service, _) = setup().await;
        let err = service
            .create(new_post(&DocumentId::new("missing")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_publish_and_views() {
        let (_, service, category) = setup().await;
        let mut input = new_post(&category.id);
        input.publish = false;
        let post = service.create(input).await.unwrap();

        let published = service.publish(&post.id).await.unwrap();
        assert!(published.is_published);
        assert!(published.updated_at.is_some());

        service.record_view(&post.id).await.unwrap();
        service.record_view(&post.id).await.unwrap();
        assert_eq!(service.get(&post.id).await.unwrap().view_count, 2);

        assert!(matches!(
            service.record_view(&DocumentId::new("nope")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_detaches_and_cascades() {
        let (store, service, category) = setup().await;
        let post = service.create(new_post(&category.id)).await.unwrap();
        store
            .insert(
                crate::ent_schema::Collection::Likes,
                serde_json::to_value(Like::new(UserId(1), post.id.clone())).unwrap(),
            )
            .await
            .unwrap();

        assert!(service.delete(&post.id).await.unwrap());
        assert!(!service.delete(&post.id).await.unwrap());

        let category = service.categories.require(&category.id).await.unwrap();
        assert_eq!(category.post_count, 0);
        assert!(category.post_ids.is_empty());
        assert_eq!(service.likes.count(&DocumentQuery::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_repairs_drift() {
        let (store, service, category) = setup().await;
        let post = service.create(new_post(&category.id)).await.unwrap();

        // A like written without touching the post cache
        store
            .insert(
                crate::ent_schema::Collection::Likes,
                serde_json::to_value(Like::new(UserId(7), post.id.clone())).unwrap(),
            )
            .await
            .unwrap();
        service
            .categories
            .update(&category.id, &[Update::set("post_count", 5)])
            .await
            .unwrap();

        let report = service.reconcile_all().await.unwrap();
        assert_eq!(report.posts_repaired, 1);
        assert_eq!(report.categories_repaired, 1);

        let post = service.get(&post.id).await.unwrap();
        assert_eq!(post.like_count, 1);
        assert_eq!(post.like_ids.len(), 1);
        assert_eq!(service.categories.require(&category.id).await.unwrap().post_count, 1);

        assert!(!service.reconcile_post_counters(&post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_reconcile_repairs_tag_drift() {
        let (store, service, category) = setup().await;
        let tag = crate::services::TagService::new(Arc::clone(&store))
            .create("lifetimes")
            .await
            .unwrap();
        let mut input = new_post(&category.id);
        input.tag_ids = vec![tag.id.clone()];
        let post = service.create(input).await.unwrap();

        service
            .tags
            .update(&tag.id, &[Update::set("post_count", 4), Update::set("post_ids", Vec::<String>::new())])
            .await
            .unwrap();

        let report = service.reconcile_all().await.unwrap();
        assert_eq!(report.tags_checked, 1);
        assert_eq!(report.tags_repaired, 1);

        let tag = service.tags.require(&tag.id).await.unwrap();
        assert_eq!(tag.post_count, 1);
        assert_eq!(tag.post_ids, vec![post.id]);
        assert!(!service.reconcile_tag_counters(&tag.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_never_drives_counts_negative() {
        let (store, service, category) = setup().await;
        let tag = crate::services::TagService::new(Arc::clone(&store))
            .create("ownership")
            .await
            .unwrap();
        let mut input = new_post(&category.id);
        input.tag_ids = vec![tag.id.clone()];
        let post = service.create(input).await.unwrap();

        // Counters that already drifted to zero
        service
            .categories
            .update(&category.id, &[Update::set("post_count", 0)])
            .await
            .unwrap();
        service.tags.update(&tag.id, &[Update::set("post_count", 0)]).await.unwrap();

        assert!(service.delete(&post.id).await.unwrap());
        assert_eq!(service.categories.require(&category.id).await.unwrap().post_count, 0);
        assert_eq!(service.tags.require(&tag.id).await.unwrap().post_count, 0);
    }
}
