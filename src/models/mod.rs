// Typed records of the content store

pub mod blog_view;
pub mod category;
pub mod comment;
pub mod like;
pub mod notification;
pub mod page;
pub mod post;
pub mod repository;
pub mod tag;

pub use blog_view::{AuthorView, BlogView};
pub use category::Category;
pub use comment::{Comment, CommentThread, NewComment};
pub use like::{Like, LikeOutcome};
pub use notification::{Notification, NotificationReference, NotificationType, ReferenceKind};
pub use page::{PageRequest, PagedResponse, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use post::{NewPost, Post};
pub use repository::{Document, Repository};
pub use tag::Tag;

pub use crate::core::strong_types::{DocumentId, UserId};
