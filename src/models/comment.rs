// Comment model - threaded through parent_comment_id

use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::{now_millis_precision, DocumentId, UserId};
use crate::ent_schema::Collection;
use crate::models::repository::Document;

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: DocumentId,
    pub content: String,
    pub author_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub post_id: DocumentId,
    /// `None` marks a root comment; stored as an explicit null
    #[serde(default)]
    pub parent_comment_id: Option<DocumentId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: DocumentId,
    pub author_id: UserId,
    #[serde(default)]
    pub author_name: Option<String>,
    pub content: String,
    #[serde(default)]
    pub parent_comment_id: Option<DocumentId>,
}

impl Comment {
    pub fn new(input: NewComment) -> Self {
        Self {
            id: DocumentId::generate(),
            content: input.content,
            author_id: input.author_id,
            author_name: input.author_name,
            post_id: input.post_id,
            parent_comment_id: input.parent_comment_id,
            is_active: true,
            created_at: now_millis_precision(),
            updated_at: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_comment_id.is_none()
    }
}

impl Document for Comment {
    const COLLECTION: Collection = Collection::Comments;

    fn id(&self) -> &DocumentId {
        &self.id
    }
}

/// A comment with its replies, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<CommentThread>,
}

impl CommentThread {
    /// Comments in this thread, including the root
    pub fn total(&self) -> usize {
        1 + self.replies.iter().map(CommentThread::total).sum::<usize>()
    }
}
