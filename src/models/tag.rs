// Tag model

use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::{now_millis_precision, DocumentId};
use crate::ent_schema::Collection;
use crate::models::repository::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: DocumentId,
    pub name: String,
    #[serde(default)]
    pub post_ids: Vec<DocumentId>,
    #[serde(default)]
    pub post_count: i64,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.into(),
            post_ids: Vec::new(),
            post_count: 0,
            created_at: now_millis_precision(),
            updated_at: None,
        }
    }
}

impl Document for Tag {
    const COLLECTION: Collection = Collection::Tags;

    fn id(&self) -> &DocumentId {
        &self.id
    }
}
