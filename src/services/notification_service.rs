// NotificationService - per-user notification feed
// Expiry is handled by the TTL sweeper, not here

use std::sync::Arc;
use tracing::{debug, info};

use crate::core::strong_types::{DocumentId, UserId};
use crate::error::AppResult;
use crate::infrastructure::database::{DocumentQuery, DocumentStore, Update};
use crate::models::{
    Notification, NotificationReference, NotificationType, PageRequest, PagedResponse, Repository,
};

#[derive(Clone)]
pub struct NotificationService {
    notifications: Repository<Notification>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            notifications: Repository::new(store),
        }
    }

    pub async fn notify(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
        message: &str,
        reference: Option<NotificationReference>,
    ) -> AppResult<Notification> {
        let notification = Notification::new(user_id, notification_type, message, reference);
        self.notifications.insert(&notification).await?;
        debug!("Notified user {} ({})", user_id, notification_type);
        Ok(notification)
    }

    /// Newest first
    pub async fn feed(&self, user_id: UserId, page: PageRequest) -> AppResult<PagedResponse<Notification>> {
        self.notifications
            .page(
                DocumentQuery::new()
                    .eq("user_id", user_id.value())
                    .sort_desc("created_at"),
                page,
            )
            .await
    }

    pub async fn unread_count(&self, user_id: UserId) -> AppResult<u64> {
        self.notifications
            .count(&unread(user_id))
            .await
    }

    /// Returns false when the notification does not exist
    pub async fn mark_read(&self, id: &DocumentId) -> AppResult<bool> {
        Ok(self
            .notifications
            .update(id, &[Update::set("is_read", true)])
            .await?
            .is_some())
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        let pending = self.notifications.find(&unread(user_id)).await?;
        let mut marked = 0;
        for notification in pending {
            if self.mark_read(&notification.id).await? {
                marked += 1;
            }
        }

        info!("Marked {} notifications read for user {}", marked, user_id);
        Ok(marked)
    }

    pub async fn by_type(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
    ) -> AppResult<Vec<Notification>> {
        self.notifications
            .find(
                &DocumentQuery::new()
                    .eq("user_id", user_id.value())
                    .eq("notification_type", notification_type.as_str())
                    .sort_desc("created_at"),
            )
            .await
    }
}

fn unread(user_id: UserId) -> DocumentQuery {
    DocumentQuery::new()
        .eq("user_id", user_id.value())
        .eq("is_read", false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDocumentStore;

    #[tokio::test]
    async fn test_feed_and_unread() {
        let service = NotificationService::new(Arc::new(SqliteDocumentStore::in_memory().await.unwrap()));
        let user = UserId(10);

        let first = service
            .notify(user, NotificationType::Like, "Your post was liked", Some(NotificationReference::Post(DocumentId::new("p1"))))
            .await
            .unwrap();
        service
            .notify(user, NotificationType::Follow, "New follower", Some(NotificationReference::User(UserId(3))))
            .await
            .unwrap();
        service
            .notify(UserId(11), NotificationType::System, "Hello", None)
            .await
            .unwrap();

        let feed = service.feed(user, PageRequest::default()).await.unwrap();
        assert_eq!(feed.total_elements, 2);
        assert_eq!(feed.content[0].notification_type, NotificationType::Follow);
        assert_eq!(feed.content[1], first);

        assert_eq!(service.unread_count(user).await.unwrap(), 2);
        assert!(service.mark_read(&first.id).await.unwrap());
        assert_eq!(service.unread_count(user).await.unwrap(), 1);
        assert_eq!(service.mark_all_read(user).await.unwrap(), 1);
        assert_eq!(service.unread_count(user).await.unwrap(), 0);

        let likes = service.by_type(user, NotificationType::Like).await.unwrap();
        assert_eq!(likes.len(), 1);
        assert!(!service.mark_read(&DocumentId::new("missing")).await.unwrap());
    }
}
