// Tag Schema

use crate::ent_schema::{
    Collection, CollectionSchema, FieldDefinition, FieldType, FieldValidator, IndexDefinition,
    IndexKey,
};

pub struct TagSchema;

impl CollectionSchema for TagSchema {
    fn collection() -> Collection {
        Collection::Tags
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String),
            FieldDefinition::new("name", FieldType::String).validate(FieldValidator::MinLength(1)),
            FieldDefinition::new("post_ids", FieldType::StringArray).optional(),
            FieldDefinition::new("post_count", FieldType::Int64)
                .optional()
                .validate(FieldValidator::Minimum(0)),
            FieldDefinition::new("created_at", FieldType::Date),
            FieldDefinition::new("updated_at", FieldType::Date).optional().nullable(),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::new("idx_tags_name_ci_unique", vec!["name"])
                .unique()
                .ignore_case(),
            IndexDefinition::with_keys("idx_tags_popular", vec![IndexKey::desc("post_count")]),
        ]
    }
}
