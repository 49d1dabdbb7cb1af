// Like Schema - the only strict collection

use crate::ent_schema::{
    Collection, CollectionSchema, FieldDefinition, FieldType, IndexDefinition, ValidationLevel,
};

pub struct LikeSchema;

impl CollectionSchema for LikeSchema {
    fn collection() -> Collection {
        Collection::Likes
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String),
            FieldDefinition::new("user_id", FieldType::Int64),
            FieldDefinition::new("post_id", FieldType::String),
            FieldDefinition::new("created_at", FieldType::Date),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![
            // At most one like per user and post; concurrent duplicates lose here
            IndexDefinition::new("idx_likes_user_post_unique", vec!["user_id", "post_id"]).unique(),
            IndexDefinition::new("idx_likes_post", vec!["post_id"]),
            IndexDefinition::new("idx_likes_user", vec!["user_id"]),
        ]
    }

    fn validation_level() -> ValidationLevel {
        ValidationLevel::Strict
    }
}
