// Category model

use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::{now_millis_precision, DocumentId};
use crate::ent_schema::Collection;
use crate::models::repository::Document;

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: DocumentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub post_ids: Vec<DocumentId>,
    #[serde(default)]
    pub post_count: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.into(),
            description,
            post_ids: Vec::new(),
            post_count: 0,
            is_active: true,
            created_at: now_millis_precision(),
            updated_at: None,
        }
    }
}

impl Document for Category {
    const COLLECTION: Collection = Collection::Categories;

    fn id(&self) -> &DocumentId {
        &self.id
    }
}
