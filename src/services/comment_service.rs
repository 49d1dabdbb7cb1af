// CommentService - threaded comments on posts

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

use crate::core::strong_types::{DocumentId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentQuery, DocumentStore, Update};
use crate::models::{Comment, CommentThread, NewComment, PageRequest, PagedResponse, Post, Repository};

#[derive(Clone)]
pub struct CommentService {
    comments: Repository<Comment>,
    posts: Repository<Post>,
}

impl CommentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            comments: Repository::new(Arc::clone(&store)),
            posts: Repository::new(store),
        }
    }

    /// Add a comment. A reply's parent must be an existing comment on the same post.
    pub async fn add(&self, input: NewComment) -> AppResult<Comment> {
        if input.content.trim().is_empty() {
            return Err(AppError::Validation("Comment content must not be empty".to_string()));
        }
        self.posts.require(&input.post_id).await?;

        if let Some(parent_id) = &input.parent_comment_id {
            match self.comments.get(parent_id).await? {
                Some(parent) if parent.post_id == input.post_id => {}
                Some(_) => {
                    return Err(AppError::Validation(format!(
                        "Parent comment {} belongs to another post",
                        parent_id
                    )))
                }
                None => {
                    return Err(AppError::Validation(format!(
                        "Parent comment does not exist: {}",
                        parent_id
                    )))
                }
            }
        }

        let comment = Comment::new(input);
        self.comments.insert(&comment).await?;
        self.posts
            .update(
                &comment.post_id,
                &[
                    Update::push("comment_ids", comment.id.as_str()),
                    Update::inc("comment_count", 1),
                ],
            )
            .await?;

        info!("Comment {} added to post {}", comment.id, comment.post_id);
        Ok(comment)
    }

    pub async fn get(&self, id: &DocumentId) -> AppResult<Comment> {
        self.comments.require(id).await
    }

    /// Active comments of a post, newest first
    pub async fn for_post(&self, post_id: &DocumentId, page: PageRequest) -> AppResult<PagedResponse<Comment>> {
        self.comments
            .page(
                DocumentQuery::new()
                    .eq("post_id", post_id.as_str())
                    .eq("is_active", true)
                    .sort_desc("created_at"),
                page,
            )
            .await
    }

    /// Active comments of a post as a forest, oldest first at every level.
    /// Replies whose parent is inactive are promoted to roots.
    pub async fn threads(&self, post_id: &DocumentId) -> AppResult<Vec<CommentThread>> {
        let comments = self
            .comments
            .find(
                &DocumentQuery::new()
                    .eq("post_id", post_id.as_str())
                    .eq("is_active", true)
                    .sort_asc("created_at"),
            )
            .await?;
        Ok(build_forest(comments))
    }

    /// Soft delete: the comment stays stored but leaves the post's cache
    pub async fn deactivate(&self, id: &DocumentId) -> AppResult<Comment> {
        let comment = self.comments.require(id).await?;
        if !comment.is_active {
            return Ok(comment);
        }

        let comment = self
            .comments
            .modify(id, &[Update::set("is_active", false), Update::touch()])
            .await?;
        self.posts
            .update(
                &comment.post_id,
                &[
                    Update::pull("comment_ids", id.as_str()),
                    Update::dec("comment_count", 1),
                ],
            )
            .await?;

        info!("Comment {} deactivated", id);
        Ok(comment)
    }

    pub async fn by_author(&self, author_id: UserId) -> AppResult<Vec<Comment>> {
        self.comments
            .find(
                &DocumentQuery::new()
                    .eq("author_id", author_id.value())
                    .sort_desc("created_at"),
            )
            .await
    }
}

fn build_forest(comments: Vec<Comment>) -> Vec<CommentThread> {
    let present: HashSet<DocumentId> = comments.iter().map(|c| c.id.clone()).collect();
    let mut children: HashMap<DocumentId, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        let parent = comment
            .parent_comment_id
            .clone()
            .filter(|parent| present.contains(parent));
        match parent {
            Some(parent) => children.entry(parent).or_default().push(comment),
            None => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children))
        .collect()
}

fn attach(comment: Comment, children: &mut HashMap<DocumentId, Vec<Comment>>) -> CommentThread {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| attach(reply, children))
        .collect();
    CommentThread { comment, replies }
}
