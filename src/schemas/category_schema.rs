// Category Schema

use crate::ent_schema::{
    Collection, CollectionSchema, FieldDefinition, FieldType, FieldValidator, IndexDefinition,
    IndexKey,
};

pub const MIN_CATEGORY_NAME_LENGTH: usize = 20;

pub struct CategorySchema;

impl CollectionSchema for CategorySchema {
    fn collection() -> Collection {
        Collection::Categories
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String),
            FieldDefinition::new("name", FieldType::String)
                .validate(FieldValidator::MinLength(MIN_CATEGORY_NAME_LENGTH))
                .describe("Globally unique category name"),
            FieldDefinition::new("description", FieldType::String).optional(),
            FieldDefinition::new("post_ids", FieldType::StringArray)
                .optional()
                .describe("Posts in this category"),
            FieldDefinition::new("post_count", FieldType::Int64)
                .optional()
                .validate(FieldValidator::Minimum(0)),
            FieldDefinition::new("is_active", FieldType::Bool).optional(),
            FieldDefinition::new("created_at", FieldType::Date),
            FieldDefinition::new("updated_at", FieldType::Date).optional().nullable(),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::new("idx_categories_name_ci_unique", vec!["name"])
                .unique()
                .ignore_case(),
            IndexDefinition::new("idx_categories_active", vec!["is_active"]),
            IndexDefinition::with_keys("idx_categories_post_count", vec![IndexKey::desc("post_count")]),
        ]
    }
}
