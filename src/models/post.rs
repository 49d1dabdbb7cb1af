// Post model

use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::{now_millis_precision, DocumentId, UserId};
use crate::ent_schema::Collection;
use crate::models::repository::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub category_id: DocumentId,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(default)]
    pub comment_ids: Vec<DocumentId>,
    #[serde(default)]
    pub tag_ids: Vec<DocumentId>,
    #[serde(default)]
    pub like_ids: Vec<DocumentId>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category_id: DocumentId,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(default)]
    pub tag_ids: Vec<DocumentId>,
    #[serde(default)]
    pub publish: bool,
}

impl Post {
    pub fn new(input: NewPost) -> Self {
        Self {
            id: DocumentId::generate(),
            title: input.title,
            content: input.content,
            category_id: input.category_id,
            author_id: input.author_id,
            author_name: input.author_name,
            comment_ids: Vec::new(),
            tag_ids: input.tag_ids,
            like_ids: Vec::new(),
            is_published: input.publish,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            created_at: now_millis_precision(),
            updated_at: None,
        }
    }
}

impl Document for Post {
    const COLLECTION: Collection = Collection::Posts;

    fn id(&self) -> &DocumentId {
        &self.id
    }
}
