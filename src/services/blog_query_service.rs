// BlogQueryService - read side of the blog API
// Published posts only; categories are resolved through an LRU cache.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::strong_types::{DocumentId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::database::{DocumentQuery, DocumentStore};
use crate::models::{BlogView, Category, PageRequest, PagedResponse, Post, Repository};

/// Category path segment that matches every category
pub const ALL_CATEGORIES: &str = "all";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct BlogQueryService {
    posts: Repository<Post>,
    categories: Repository<Category>,
    category_cache: Arc<Mutex<Cache<DocumentId, Category>>>,
}

impl BlogQueryService {
    pub fn new(store: Arc<dyn DocumentStore>, cache_capacity: usize) -> Self {
        Self {
            posts: Repository::new(Arc::clone(&store)),
            categories: Repository::new(store),
            category_cache: Arc::new(Mutex::new(Cache::new(cache_capacity))),
        }
    }

    /// Published posts in a category (case-insensitive name, `all` for every category), newest first.
    /// An unknown category yields an empty page.
    pub async fn blogs_by_category(&self, category: &str, page: PageRequest) -> AppResult<PagedResponse<BlogView>> {
        match self.category_filter(category).await? {
            Some(query) => self.page_of_views(query.sort_desc("created_at"), page).await,
            None => Ok(PagedResponse::empty(page)),
        }
    }

    /// As `blogs_by_category`, restricted to posts created between the two `yyyy-MM-dd` dates inclusive
    pub async fn blogs_by_category_and_dates(
        &self,
        category: &str,
        start_date: &str,
        end_date: &str,
        page: PageRequest,
    ) -> AppResult<PagedResponse<BlogView>> {
        let (from, to) = parse_date_range(start_date, end_date)?;

        match self.category_filter(category).await? {
            Some(query) => {
                let query = query
                    .gte("created_at", from)
                    .lte("created_at", to)
                    .sort_desc("created_at");
                self.page_of_views(query, page).await
            }
            None => Ok(PagedResponse::empty(page)),
        }
    }

    /// Sorted names of active categories
    pub async fn category_names(&self) -> AppResult<Vec<String>> {
        let mut names: Vec<String> = self
            .categories
            .find(&DocumentQuery::new().eq("is_active", true).sort_asc("name"))
            .await?
            .into_iter()
            .map(|category| category.name)
            .collect();
        names.dedup();
        Ok(names)
    }

    /// A single published post. Drafts are reported as not found.
    pub async fn blog(&self, post_id: &DocumentId) -> AppResult<BlogView> {
        match self.posts.get(post_id).await? {
            Some(post) if post.is_published => {
                let category = self.category(&post.category_id).await?;
                Ok(BlogView::from_post(post, category.as_ref()))
            }
            _ => Err(AppError::NotFound(format!("Blog not found with id: {}", post_id))),
        }
    }

    pub async fn blogs_by_author(&self, author_id: UserId, page: PageRequest) -> AppResult<PagedResponse<BlogView>> {
        let query = published()
            .eq("author_id", author_id.value())
            .sort_desc("created_at");
        self.page_of_views(query, page).await
    }

    /// Free-text search over title and content of published posts
    pub async fn search(&self, terms: &str, page: PageRequest) -> AppResult<PagedResponse<BlogView>> {
        if terms.trim().is_empty() {
            return Err(AppError::BadRequest("Search query must not be empty".to_string()));
        }
        let query = published().text(terms.trim()).sort_desc("created_at");
        self.page_of_views(query, page).await
    }

    pub async fn clear_cache(&self) {
        self.category_cache.lock().await.clear();
    }

    /// Published-post query for a category name, `None` if no such category exists
    async fn category_filter(&self, category: &str) -> AppResult<Option<DocumentQuery>> {
        let category = category.trim();
        if category.is_empty() {
            return Err(AppError::BadRequest("Category must not be empty".to_string()));
        }
        if category.eq_ignore_ascii_case(ALL_CATEGORIES) {
            return Ok(Some(published()));
        }

        let found = self
            .categories
            .find_one(DocumentQuery::new().eq_ignore_case("name", category))
            .await?;
        let Some(found) = found else {
            debug!("No category named '{}'", category);
            return Ok(None);
        };

        let query = published().eq("category_id", found.id.as_str());
        self.category_cache.lock().await.insert(found.id.clone(), found);
        Ok(Some(query))
    }

    async fn page_of_views(&self, query: DocumentQuery, page: PageRequest) -> AppResult<PagedResponse<BlogView>> {
        let mut posts = self.posts.page(query, page).await?;

        let mut views = Vec::with_capacity(posts.content.len());
        for post in std::mem::take(&mut posts.content) {
            let category = self.category(&post.category_id).await?;
            views.push(BlogView::from_post(post, category.as_ref()));
        }
        Ok(posts.with_content(views))
    }

    async fn category(&self, id: &DocumentId) -> AppResult<Option<Category>> {
        if let Some(category) = self.category_cache.lock().await.get(id) {
            return Ok(Some(category));
        }

        let category = self.categories.get(id).await?;
        if let Some(category) = &category {
            self.category_cache
                .lock()
                .await
                .insert(id.clone(), category.clone());
        }
        Ok(category)
    }
}

fn published() -> DocumentQuery {
    DocumentQuery::new().eq("is_published", true)
}

/// Epoch millis bounds of [start 00:00:00.000, end 23:59:59.999] UTC
pub fn parse_date_range(start_date: &str, end_date: &str) -> AppResult<(i64, i64)> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    if start > end {
        return Err(AppError::BadRequest(
            "Start date must not be after end date".to_string(),
        ));
    }

    let end_of_day = end
        .and_hms_milli_opt(23, 59, 59, 999)
        .ok_or_else(|| AppError::BadRequest(format!("End date out of range: {}", end_date)))?;
    let from = Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN));
    let to = Utc.from_utc_datetime(&end_of_day);
    Ok((from.timestamp_millis(), to.timestamp_millis()))
}

fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        AppError::BadRequest("Invalid date format. Expected: yyyy-MM-dd".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_bounds() {
        let (from, to) = parse_date_range("2024-03-01", "2024-03-01").unwrap();
        assert_eq!(to - from, 24 * 60 * 60 * 1000 - 1);
        assert_eq!(from, 1_709_251_200_000);
    }

    #[test]
    fn test_date_range_on_last_representable_day() {
        let last = NaiveDate::MAX.format(DATE_FORMAT).to_string();
        let (from, to) = parse_date_range(&last, &last).unwrap();
        assert_eq!(to - from, 24 * 60 * 60 * 1000 - 1);
    }

    #[test]
    fn test_bad_dates() {
        assert!(matches!(
            parse_date_range("2024/03/01", "2024-03-02"),
            Err(AppError::BadRequest(msg)) if msg.contains("yyyy-MM-dd")
        ));
        assert!(matches!(
            parse_date_range("2024-03-05", "2024-03-01"),
            Err(AppError::BadRequest(_))
        ));
    }
}
