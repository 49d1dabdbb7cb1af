// Notification model - expires 90 days after creation
// The polymorphic reference is persisted as reference_id + reference_type

use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::strong_types::{now_millis_precision, DocumentId, UserId};
use crate::ent_schema::Collection;
use crate::models::repository::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Comment,
    Like,
    Follow,
    Mention,
    System,
    NewPost,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Comment => "COMMENT",
            NotificationType::Like => "LIKE",
            NotificationType::Follow => "FOLLOW",
            NotificationType::Mention => "MENTION",
            NotificationType::System => "SYSTEM",
            NotificationType::NewPost => "NEW_POST",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted discriminant of a `NotificationReference`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceKind {
    Post,
    Comment,
    Like,
    Category,
    Tag,
    User,
}

/// What a notification points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationReference {
    Post(DocumentId),
    Comment(DocumentId),
    Like(DocumentId),
    Category(DocumentId),
    Tag(DocumentId),
    User(UserId),
}

impl NotificationReference {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            NotificationReference::Post(_) => ReferenceKind::Post,
            NotificationReference::Comment(_) => ReferenceKind::Comment,
            NotificationReference::Like(_) => ReferenceKind::Like,
            NotificationReference::Category(_) => ReferenceKind::Category,
            NotificationReference::Tag(_) => ReferenceKind::Tag,
            NotificationReference::User(_) => ReferenceKind::User,
        }
    }

    pub fn reference_id(&self) -> String {
        match self {
            NotificationReference::Post(id)
            | NotificationReference::Comment(id)
            | NotificationReference::Like(id)
            | NotificationReference::Category(id)
            | NotificationReference::Tag(id) => id.to_string(),
            NotificationReference::User(user) => user.to_string(),
        }
    }

    pub fn from_parts(kind: ReferenceKind, id: String) -> Result<Self, String> {
        Ok(match kind {
            ReferenceKind::Post => NotificationReference::Post(id.into()),
            ReferenceKind::Comment => NotificationReference::Comment(id.into()),
            ReferenceKind::Like => NotificationReference::Like(id.into()),
            ReferenceKind::Category => NotificationReference::Category(id.into()),
            ReferenceKind::Tag => NotificationReference::Tag(id.into()),
            ReferenceKind::User => NotificationReference::User(UserId(
                id.parse()
                    .map_err(|_| format!("user reference '{}' is not a numeric id", id))?,
            )),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredNotification", into = "StoredNotification")]
pub struct Notification {
    pub id: DocumentId,
    pub user_id: UserId,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub reference: Option<NotificationReference>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: UserId,
        notification_type: NotificationType,
        message: impl Into<String>,
        reference: Option<NotificationReference>,
    ) -> Self {
        Self {
            id: DocumentId::generate(),
            user_id,
            message: message.into(),
            notification_type,
            is_read: false,
            reference,
            created_at: now_millis_precision(),
        }
    }
}

impl Document for Notification {
    const COLLECTION: Collection = Collection::Notifications;

    fn id(&self) -> &DocumentId {
        &self.id
    }
}

/// Stored shape of a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNotification {
    id: DocumentId,
    user_id: UserId,
    message: String,
    notification_type: NotificationType,
    #[serde(default)]
    is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference_type: Option<ReferenceKind>,
    #[serde(with = "ts_milliseconds")]
    created_at: DateTime<Utc>,
}

impl TryFrom<StoredNotification> for Notification {
    type Error = String;

    fn try_from(stored: StoredNotification) -> Result<Self, Self::Error> {
        let reference = match (stored.reference_type, stored.reference_id) {
            (Some(kind), Some(id)) => Some(NotificationReference::from_parts(kind, id)?),
            (None, None) => None,
            _ => return Err("reference_id and reference_type must be set together".to_string()),
        };

        Ok(Self {
            id: stored.id,
            user_id: stored.user_id,
            message: stored.message,
            notification_type: stored.notification_type,
            is_read: stored.is_read,
            reference,
            created_at: stored.created_at,
        })
    }
}

impl From<Notification> for StoredNotification {
    fn from(notification: Notification) -> Self {
        let (reference_id, reference_type) = match &notification.reference {
            Some(reference) => (Some(reference.reference_id()), Some(reference.kind())),
            None => (None, None),
        };

        Self {
            id: notification.id,
            user_id: notification.user_id,
            message: notification.message,
            notification_type: notification.notification_type,
            is_read: notification.is_read,
            reference_id,
            reference_type,
            created_at: notification.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_is_flattened() {
        let notification = Notification::new(
            UserId(5),
            NotificationType::Comment,
            "Someone replied to your post",
            Some(NotificationReference::Comment(DocumentId::new("c9"))),
        );

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["reference_id"], "c9");
        assert_eq!(json["reference_type"], "COMMENT");
        assert_eq!(json["notification_type"], "COMMENT");
        assert_eq!(json["is_read"], false);

        let back: Notification = serde_json::from_value(json).unwrap();
        assert_eq!(back, notification);
    }

    #[test]
    fn test_user_reference_and_no_reference() {
        let follow = Notification::new(
            UserId(1),
            NotificationType::Follow,
            "New follower",
            Some(NotificationReference::User(UserId(77))),
        );
        let json = serde_json::to_value(&follow).unwrap();
        assert_eq!(json["reference_id"], "77");

        let system = Notification::new(UserId(1), NotificationType::System, "Maintenance", None);
        let json = serde_json::to_value(&system).unwrap();
        assert!(json.get("reference_id").is_none());
        let back: Notification = serde_json::from_value(json).unwrap();
        assert_eq!(back.reference, None);
    }

    #[test]
    fn test_half_reference_is_rejected() {
        let result: Result<Notification, _> = serde_json::from_value(json!({
            "id": "n1",
            "user_id": 1,
            "message": "x",
            "notification_type": "LIKE",
            "reference_id": "p1",
            "created_at": 0
        }));
        assert!(result.is_err());
    }
}
