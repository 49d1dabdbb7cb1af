use serde::Serialize;
use tracing::info;

use crate::{app_state::AppState, error::AppResult, models::Category};

pub const SAMPLE_CATEGORY: &str = "Technology and Innovation";
pub const SAMPLE_CATEGORY_DESCRIPTION: &str =
    "Posts about emerging technology, software engineering and innovation";
pub const SAMPLE_TAG: &str = "programming";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub categories_created: u32,
    pub tags_created: u32,
}

/// Seed the sample category and tag. Running it again creates nothing.
pub async fn seed_sample_data(state: &AppState) -> AppResult<SeedReport> {
    let mut report = SeedReport::default();

    if ensure_category(state).await?.is_some() {
        report.categories_created += 1;
    }

    if state.tags.find_by_name(SAMPLE_TAG).await?.is_none() {
        state.tags.get_or_create(SAMPLE_TAG).await?;
        report.tags_created += 1;
    }

    info!(
        "Sample data seeded: {} categories, {} tags created",
        report.categories_created, report.tags_created
    );
    Ok(report)
}

async fn ensure_category(state: &AppState) -> AppResult<Option<Category>> {
    if state.categories.find_by_name(SAMPLE_CATEGORY).await?.is_some() {
        return Ok(None);
    }

    match state
        .categories
        .create(SAMPLE_CATEGORY, Some(SAMPLE_CATEGORY_DESCRIPTION.to_string()))
        .await
    {
        Ok(category) => Ok(Some(category)),
        // Seeded concurrently by another instance
        Err(crate::error::AppError::AlreadyExists(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let state = AppState::in_memory().await.unwrap();

        let first = seed_sample_data(&state).await.unwrap();
        assert_eq!(first, SeedReport { categories_created: 1, tags_created: 1 });

        let second = seed_sample_data(&state).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let category = state.categories.find_by_name(SAMPLE_CATEGORY).await.unwrap().unwrap();
        assert_eq!(category.post_count, 0);
        assert_eq!(state.blogs.category_names().await.unwrap(), vec![SAMPLE_CATEGORY.to_string()]);
    }
}
