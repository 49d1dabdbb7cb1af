// BlogClient - typed HTTP client for the blog read API
// Unwraps the response envelope; a missing post is NotFound, connectivity problems are Transport.

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::api::envelope::ApiResponse;
use crate::api::routes::BLOGS_BASE_PATH;
use crate::config::Config;
use crate::core::strong_types::{DocumentId, UserId};
use crate::error::{AppError, AppResult};
use crate::models::{BlogView, PageRequest, PagedResponse};

#[derive(Debug, Clone)]
pub struct BlogClient {
    http: Client,
    base_url: Url,
}

impl BlogClient {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::ConfigurationError(format!("Invalid API base URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::ConfigurationError(format!(
                "API base URL '{}' cannot have a path",
                base_url
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("blogsite-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::ConfigurationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(&config.client.base_url, config.client_timeout())
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        self.get(&["categories"], &[]).await
    }

    pub async fn blogs_by_category(&self, category: &str, page: PageRequest) -> AppResult<PagedResponse<BlogView>> {
        self.get(&["info", category], &page_query(page)).await
    }

    pub async fn blogs_by_category_and_dates(
        &self,
        category: &str,
        start_date: &str,
        end_date: &str,
        page: PageRequest,
    ) -> AppResult<PagedResponse<BlogView>> {
        let mut query = page_query(page);
        query.push(("startDate", start_date.to_string()));
        query.push(("endDate", end_date.to_string()));
        self.get(&["get", category], &query).await
    }

    /// A missing or unpublished post is `AppError::NotFound`
    pub async fn blog_by_id(&self, post_id: &DocumentId) -> AppResult<BlogView> {
        self.get(&[post_id.as_str()], &[]).await
    }

    pub async fn blogs_by_author(&self, author_id: UserId, page: PageRequest) -> AppResult<PagedResponse<BlogView>> {
        let author = author_id.to_string();
        self.get(&["author", author.as_str()], &page_query(page)).await
    }

    pub async fn search(&self, terms: &str, page: PageRequest) -> AppResult<PagedResponse<BlogView>> {
        let mut query = page_query(page);
        query.push(("q", terms.to_string()));
        self.get(&["search"], &query).await
    }

    /// True when the server answers its health check with "UP"
    pub async fn health(&self) -> AppResult<bool> {
        let url = self.url_for(["health"])?;
        let status: String = self.fetch(url, &[]).await?;
        Ok(status == "UP")
    }

    fn url_for<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::ConfigurationError("API base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let base = BLOGS_BASE_PATH.trim_start_matches('/').split('/');
        self.url_for(base.chain(segments.iter().copied()))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> AppResult<T> {
        let url = self.endpoint(segments)?;
        self.fetch(url, query).await
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> AppResult<T> {
        debug!("GET {}", url);

        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            let envelope: ApiResponse<T> = serde_json::from_slice(&body)
                .map_err(|e| AppError::Transport(format!("Failed to decode response: {}", e)))?;
            if !envelope.success {
                return Err(AppError::ServiceUnavailable(non_empty_or(
                    envelope.message,
                    "Request was not successful",
                )));
            }
            return envelope
                .data
                .ok_or_else(|| AppError::Transport("Response envelope carries no data".to_string()));
        }

        // Error bodies are envelopes too, but a proxy may answer with anything
        let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body)
            .map(|envelope| envelope.message)
            .unwrap_or_default();
        Err(status_error(status, message))
    }
}

fn page_query(page: PageRequest) -> Vec<(&'static str, String)> {
    vec![("page", page.page.to_string()), ("size", page.size.to_string())]
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

fn status_error(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(non_empty_or(message, "Resource not found")),
        StatusCode::BAD_REQUEST => AppError::BadRequest(non_empty_or(message, "Invalid request")),
        StatusCode::CONFLICT => AppError::AlreadyExists(non_empty_or(message, "Resource already exists")),
        _ => AppError::ServiceUnavailable(non_empty_or(
            message,
            &format!("Server responded with {}", status),
        )),
    }
}
