// Post Schema - blog articles and their denormalized engagement data

use crate::ent_schema::{
    Collection, CollectionSchema, FieldDefinition, FieldType, FieldValidator, IndexDefinition,
    IndexKey,
};

pub const MIN_TITLE_LENGTH: usize = 20;

pub struct PostSchema;

impl CollectionSchema for PostSchema {
    fn collection() -> Collection {
        Collection::Posts
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String).describe("Unique identifier for the post"),
            FieldDefinition::new("title", FieldType::String)
                .validate(FieldValidator::MinLength(MIN_TITLE_LENGTH))
                .describe("Post title"),
            FieldDefinition::new("content", FieldType::String).describe("Article body"),
            FieldDefinition::new("category_id", FieldType::String)
                .describe("Reference to a category document"),
            FieldDefinition::new("author_id", FieldType::Int64)
                .describe("Reference to a user in the identity system"),
            FieldDefinition::new("author_name", FieldType::String).describe("Author display name"),
            // Denormalized back-references
            FieldDefinition::new("comment_ids", FieldType::StringArray).optional(),
            FieldDefinition::new("tag_ids", FieldType::StringArray).optional(),
            FieldDefinition::new("like_ids", FieldType::StringArray).optional(),
            FieldDefinition::new("is_published", FieldType::Bool).optional(),
            // Engagement counters
            FieldDefinition::new("view_count", FieldType::Int64)
                .optional()
                .validate(FieldValidator::Minimum(0)),
            FieldDefinition::new("like_count", FieldType::Int64)
                .optional()
                .validate(FieldValidator::Minimum(0)),
            FieldDefinition::new("comment_count", FieldType::Int64)
                .optional()
                .validate(FieldValidator::Minimum(0)),
            FieldDefinition::new("created_at", FieldType::Date),
            FieldDefinition::new("updated_at", FieldType::Date).optional().nullable(),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::new("idx_posts_text_search", vec!["title", "content"]).text(),
            IndexDefinition::new("idx_posts_category", vec!["category_id"]),
            IndexDefinition::new("idx_posts_author", vec!["author_id"]),
            IndexDefinition::with_keys("idx_posts_created_at", vec![IndexKey::desc("created_at")]),
            IndexDefinition::with_keys(
                "idx_posts_published",
                vec![IndexKey::asc("is_published"), IndexKey::desc("created_at")],
            ),
            IndexDefinition::new("idx_posts_tags", vec!["tag_ids"]).multi_key(),
            IndexDefinition::new("idx_posts_popular", vec!["view_count"]),
        ]
    }
}
