// Comment Schema - threaded through parent_comment_id

use crate::ent_schema::{
    Collection, CollectionSchema, FieldDefinition, FieldType, IndexDefinition, IndexKey,
};

pub struct CommentSchema;

impl CollectionSchema for CommentSchema {
    fn collection() -> Collection {
        Collection::Comments
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String),
            FieldDefinition::new("content", FieldType::String),
            FieldDefinition::new("author_id", FieldType::Int64),
            FieldDefinition::new("author_name", FieldType::String).optional(),
            FieldDefinition::new("post_id", FieldType::String),
            // null marks a root comment
            FieldDefinition::new("parent_comment_id", FieldType::String)
                .optional()
                .nullable(),
            FieldDefinition::new("is_active", FieldType::Bool).optional(),
            FieldDefinition::new("created_at", FieldType::Date),
            FieldDefinition::new("updated_at", FieldType::Date).optional().nullable(),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::with_keys(
                "idx_comments_post_date",
                vec![IndexKey::asc("post_id"), IndexKey::desc("created_at")],
            ),
            IndexDefinition::new("idx_comments_author", vec!["author_id"]),
            IndexDefinition::new("idx_comments_parent", vec!["parent_comment_id"]),
            IndexDefinition::new("idx_comments_active", vec!["is_active"]),
        ]
    }
}
