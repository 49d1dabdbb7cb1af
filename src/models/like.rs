// Like model - at most one per (user_id, post_id)

use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::{now_millis_precision, DocumentId, UserId};
use crate::ent_schema::Collection;
use crate::models::repository::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: DocumentId,
    pub user_id: UserId,
    pub post_id: DocumentId,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(user_id: UserId, post_id: DocumentId) -> Self {
        Self {
            id: DocumentId::generate(),
            user_id,
            post_id,
            created_at: now_millis_precision(),
        }
    }
}

impl Document for Like {
    const COLLECTION: Collection = Collection::Likes;

    fn id(&self) -> &DocumentId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LikeOutcome {
    Liked(Like),
    /// The user had already liked the post; nothing was written
    AlreadyLiked,
}

impl LikeOutcome {
    pub fn is_liked(&self) -> bool {
        matches!(self, LikeOutcome::Liked(_))
    }
}
