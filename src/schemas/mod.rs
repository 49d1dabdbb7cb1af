// Schema definitions module - centralized schema registry

pub mod category_schema;
pub mod comment_schema;
pub mod like_schema;
pub mod notification_schema;
pub mod post_schema;
pub mod tag_schema;

use crate::ent_schema::SchemaRegistry;

pub use category_schema::{CategorySchema, MIN_CATEGORY_NAME_LENGTH};
pub use comment_schema::CommentSchema;
pub use like_schema::LikeSchema;
pub use notification_schema::{NotificationSchema, NOTIFICATION_RETENTION};
pub use post_schema::{PostSchema, MIN_TITLE_LENGTH};
pub use tag_schema::TagSchema;

/// Initialize and register all schemas
pub fn create_schema_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();

    registry.register::<PostSchema>();
    registry.register::<CategorySchema>();
    registry.register::<CommentSchema>();
    registry.register::<TagSchema>();
    registry.register::<LikeSchema>();
    registry.register::<NotificationSchema>();

    registry
}

/// Validate all registered schemas
pub fn validate_schemas() -> Result<(), Vec<String>> {
    create_schema_registry().validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ent_schema::{Collection, ValidationLevel};

    #[test]
    fn test_all_schemas_are_consistent() {
        assert_eq!(validate_schemas(), Ok(()));
    }

    #[test]
    fn test_only_likes_are_strict() {
        let registry = create_schema_registry();
        for collection in Collection::ALL {
            let level = registry.get(collection).unwrap().validation_level;
            if collection == Collection::Likes {
                assert_eq!(level, ValidationLevel::Strict);
            } else {
                assert_eq!(level, ValidationLevel::Advisory, "{}", collection);
            }
        }
    }

    #[test]
    fn test_only_notifications_expire() {
        let registry = create_schema_registry();
        for definition in registry.definitions() {
            let rules = definition.ttl_rules();
            if definition.collection == Collection::Notifications {
                assert_eq!(rules, vec![("created_at", NOTIFICATION_RETENTION)]);
            } else {
                assert!(rules.is_empty(), "{}", definition.collection);
            }
        }
    }
}
