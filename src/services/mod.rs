// Content services - business operations over the typed repositories

pub mod backup_service;
pub mod blog_query_service;
pub mod category_service;
pub mod comment_service;
pub mod like_service;
pub mod notification_service;
pub mod post_service;
pub mod tag_service;

pub use backup_service::{BackupScheduler, BackupService, BackupStatus};
pub use blog_query_service::BlogQueryService;
pub use category_service::CategoryService;
pub use comment_service::CommentService;
pub use like_service::LikeService;
pub use notification_service::NotificationService;
pub use post_service::{PostService, ReconcileReport};
pub use tag_service::TagService;
