// Notification Schema - expires 90 days after creation

use std::time::Duration;

use crate::ent_schema::{
    Collection, CollectionSchema, FieldDefinition, FieldType, IndexDefinition, IndexKey,
};

pub const NOTIFICATION_RETENTION: Duration = Duration::from_secs(90 * 24 * 60 * 60);

pub struct NotificationSchema;

impl CollectionSchema for NotificationSchema {
    fn collection() -> Collection {
        Collection::Notifications
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String),
            FieldDefinition::new("user_id", FieldType::Int64).describe("Recipient"),
            FieldDefinition::new("message", FieldType::String),
            FieldDefinition::new("is_read", FieldType::Bool).optional(),
            FieldDefinition::new(
                "notification_type",
                FieldType::enumeration(&["COMMENT", "LIKE", "FOLLOW", "MENTION", "SYSTEM", "NEW_POST"]),
            ),
            FieldDefinition::new("reference_id", FieldType::String)
                .optional()
                .nullable(),
            FieldDefinition::new(
                "reference_type",
                FieldType::enumeration(&["POST", "COMMENT", "LIKE", "CATEGORY", "TAG", "USER"]),
            )
            .optional()
            .nullable(),
            FieldDefinition::new("created_at", FieldType::Date),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::with_keys(
                "idx_notifications_user_date",
                vec![IndexKey::asc("user_id"), IndexKey::desc("created_at")],
            ),
            IndexDefinition::new("idx_notifications_user_unread", vec!["user_id", "is_read"]),
            IndexDefinition::new("idx_notifications_type", vec!["notification_type"]),
            IndexDefinition::new("idx_notifications_ttl", vec!["created_at"])
                .expire_after(NOTIFICATION_RETENTION),
        ]
    }
}
