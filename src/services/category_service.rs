// CategoryService - category lifecycle and lookups

use std::sync::Arc;
use tracing::info;

use crate::core::strong_types::DocumentId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentQuery, DocumentStore, Update};
use crate::models::{Category, Repository};
use crate::schemas::MIN_CATEGORY_NAME_LENGTH;

#[derive(Clone)]
pub struct CategoryService {
    categories: Repository<Category>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            categories: Repository::new(store),
        }
    }

    /// Create a category. Names are unique; a duplicate is `AppError::AlreadyExists`.
    pub async fn create(&self, name: &str, description: Option<String>) -> AppResult<Category> {
        let name = name.trim();
        if name.chars().count() < MIN_CATEGORY_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "Category name must be at least {} characters",
                MIN_CATEGORY_NAME_LENGTH
            )));
        }

        let category = Category::new(name, description);
        self.categories.insert(&category).await?;

        info!("Created category '{}' ({})", category.name, category.id);
        Ok(category)
    }

    pub async fn get(&self, id: &DocumentId) -> AppResult<Category> {
        self.categories.require(id).await
    }

    pub async fn find(&self, id: &DocumentId) -> AppResult<Option<Category>> {
        self.categories.get(id).await
    }

    /// Case-insensitive name lookup
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        self.categories
            .find_one(DocumentQuery::new().eq_ignore_case("name", name.trim()))
            .await
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        self.categories
            .find(&DocumentQuery::new().sort_asc("name"))
            .await
    }

    /// Sorted, distinct names of active categories
    pub async fn active_names(&self) -> AppResult<Vec<String>> {
        let mut names: Vec<String> = self
            .categories
            .find(&DocumentQuery::new().eq("is_active", true).sort_asc("name"))
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        names.dedup();
        Ok(names)
    }

    /// Active categories with the most posts first
    pub async fn largest(&self, limit: u64) -> AppResult<Vec<Category>> {
        self.categories
            .find(
                &DocumentQuery::new()
                    .eq("is_active", true)
                    .sort_desc("post_count")
                    .limit(limit),
            )
            .await
    }

    pub async fn deactivate(&self, id: &DocumentId) -> AppResult<Category> {
        let category = self
            .categories
            .modify(id, &[Update::set("is_active", false), Update::touch()])
            .await?;
        info!("Deactivated category '{}'", category.name);
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDocumentStore;

    async fn service() -> CategoryService {
        CategoryService::new(Arc::new(SqliteDocumentStore::in_memory().await.unwrap()))
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let service = service().await;
        let first = service.create("Technology and Innovation", None).await.unwrap();

        let err = service
            .create("Technology and Innovation", Some("again".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        assert_eq!(service.list().await.unwrap(), vec![first]);
    }

    #[tokio::test]
    async fn test_short_name_is_rejected() {
        let service = service().await;
        let err = service.create("Tech", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_lookup_and_active_names() {
        let service = service().await;
        let travel = service.create("Travel and Exploration Notes", None).await.unwrap();
        service.create("Technology and Innovation", None).await.unwrap();

        let found = service.find_by_name("technology AND innovation").await.unwrap();
        assert_eq!(found.unwrap().name, "Technology and Innovation");

        service.deactivate(&travel.id).await.unwrap();
        assert_eq!(
            service.active_names().await.unwrap(),
            vec!["Technology and Innovation".to_string()]
        );
        assert!(service.get(&travel.id).await.unwrap().updated_at.is_some());
    }
}
