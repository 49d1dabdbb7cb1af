// Blog read API - axum router and handlers

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::Uri,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::api::envelope::ApiResponse;
use crate::app_state::AppState;
use crate::core::strong_types::{DocumentId, UserId};
use crate::error::AppError;
use crate::models::{BlogView, PageRequest, PagedResponse};
use crate::services::BackupStatus;

pub const BLOGS_BASE_PATH: &str = "/api/v1.0/blogsite/blogs";
pub const BACKUP_ADMIN_PATH: &str = "/api/v1.0/blogsite/admin/backup";

/// An `AppError` tagged with the request path it occurred on
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    path: String,
}

impl ApiError {
    fn new(error: AppError, uri: &Uri) -> Self {
        Self {
            error,
            path: uri.path().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ApiResponse::<()>::error(self.error.public_message()).with_path(self.path);
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest(BLOGS_BASE_PATH, blog_routes())
        .nest(BACKUP_ADMIN_PATH, backup_routes())
        .fallback(not_found_handler)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/info/{category}", get(blogs_by_category_handler))
        .route("/get/{category}", get(blogs_by_date_query_handler))
        .route("/get/{category}/{start_date}/{end_date}", get(blogs_by_date_path_handler))
        .route("/categories", get(categories_handler))
        .route("/author/{author_id}", get(blogs_by_author_handler))
        .route("/search", get(search_handler))
        .route("/{post_id}", get(blog_handler))
}

fn backup_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(backup_status_handler))
        .route("/trigger", post(backup_trigger_handler))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupReceipt {
    pub backup_file: String,
    pub record_count: u64,
    pub status: &'static str,
}

// HTTP Handlers

pub async fn health_handler() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("UP", "Service is healthy"))
}

pub async fn not_found_handler(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::new(AppError::NotFound("No such endpoint".to_string()), &uri)
}

pub async fn blogs_by_category_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(category): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<PagedResponse<BlogView>> {
    let Query(params) = params.map_err(|e| bad_query(e, &uri))?;
    let page = PageRequest::from_params(params.page, params.size);
    debug!("Blogs in '{}' page {} size {}", category, page.page, page.size);

    let blogs = state
        .blogs
        .blogs_by_category(&category, page)
        .await
        .map_err(|e| ApiError::new(e, &uri))?;
    Ok(Json(ApiResponse::success(blogs, "Blogs retrieved successfully")))
}

pub async fn blogs_by_date_query_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(category): Path<String>,
    params: Result<Query<DateRangeParams>, QueryRejection>,
) -> ApiResult<PagedResponse<BlogView>> {
    let Query(params) = params.map_err(|e| bad_query(e, &uri))?;
    let (Some(start_date), Some(end_date)) = (params.start_date, params.end_date) else {
        return Err(ApiError::new(
            AppError::BadRequest("startDate and endDate are required".to_string()),
            &uri,
        ));
    };

    blogs_by_date(&state, &uri, &category, &start_date, &end_date, params.page, params.size).await
}

pub async fn blogs_by_date_path_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path((category, start_date, end_date)): Path<(String, String, String)>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<PagedResponse<BlogView>> {
    let Query(params) = params.map_err(|e| bad_query(e, &uri))?;
    blogs_by_date(&state, &uri, &category, &start_date, &end_date, params.page, params.size).await
}

async fn blogs_by_date(
    state: &AppState,
    uri: &Uri,
    category: &str,
    start_date: &str,
    end_date: &str,
    page: Option<i64>,
    size: Option<i64>,
) -> ApiResult<PagedResponse<BlogView>> {
    let page = PageRequest::from_params(page, size);
    let blogs = state
        .blogs
        .blogs_by_category_and_dates(category, start_date, end_date, page)
        .await
        .map_err(|e| ApiError::new(e, uri))?;
    Ok(Json(ApiResponse::success(blogs, "Blogs retrieved successfully")))
}

pub async fn categories_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Vec<String>> {
    let names = state
        .blogs
        .category_names()
        .await
        .map_err(|e| ApiError::new(e, &uri))?;
    Ok(Json(ApiResponse::success(names, "Categories retrieved successfully")))
}

pub async fn blog_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(post_id): Path<String>,
) -> ApiResult<BlogView> {
    let blog = state
        .blogs
        .blog(&DocumentId::new(post_id))
        .await
        .map_err(|e| ApiError::new(e, &uri))?;
    Ok(Json(ApiResponse::success(blog, "Blog retrieved successfully")))
}

pub async fn blogs_by_author_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    author_id: Result<Path<i64>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<PagedResponse<BlogView>> {
    let Path(author_id) = author_id.map_err(|_| {
        ApiError::new(AppError::BadRequest("Author id must be a number".to_string()), &uri)
    })?;
    let Query(params) = params.map_err(|e| bad_query(e, &uri))?;

    let blogs = state
        .blogs
        .blogs_by_author(UserId(author_id), PageRequest::from_params(params.page, params.size))
        .await
        .map_err(|e| ApiError::new(e, &uri))?;
    Ok(Json(ApiResponse::success(blogs, "Blogs retrieved successfully")))
}

pub async fn search_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<PagedResponse<BlogView>> {
    let Query(params) = params.map_err(|e| bad_query(e, &uri))?;
    let terms = params.q.unwrap_or_default();

    let blogs = state
        .blogs
        .search(&terms, PageRequest::from_params(params.page, params.size))
        .await
        .map_err(|e| ApiError::new(e, &uri))?;
    Ok(Json(ApiResponse::success(blogs, "Search completed successfully")))
}

pub async fn backup_status_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<BackupStatus> {
    let status = state.backups.status().await.map_err(|e| ApiError::new(e, &uri))?;
    Ok(Json(ApiResponse::success(status, "Backup status retrieved")))
}

pub async fn backup_trigger_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<BackupReceipt> {
    let path = state
        .backups
        .perform_backup()
        .await
        .map_err(|e| ApiError::new(e, &uri))?;
    let record_count = state.backups.record_count().await.map_err(|e| ApiError::new(e, &uri))?;

    Ok(Json(ApiResponse::success(
        BackupReceipt {
            backup_file: path.display().to_string(),
            record_count,
            status: "SUCCESS",
        },
        "Backup completed successfully",
    )))
}

fn bad_query(rejection: QueryRejection, uri: &Uri) -> ApiError {
    debug!("Rejected query string: {}", rejection);
    ApiError::new(
        AppError::BadRequest(format!("Invalid query parameters: {}", rejection.body_text())),
        uri,
    )
}
