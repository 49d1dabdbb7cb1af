// HTTP read API

pub mod envelope;
pub mod routes;

pub use envelope::ApiResponse;
pub use routes::{create_router, ApiError, BACKUP_ADMIN_PATH, BLOGS_BASE_PATH};
