// Typed repository over the document store

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

use crate::core::strong_types::DocumentId;
use crate::ent_schema::Collection;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DocumentQuery, DocumentStore, Update, WriteOutcome};
use crate::models::page::{PageRequest, PagedResponse};

/// A record type stored in one collection
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &DocumentId;
}

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn insert(&self, record: &T) -> AppResult<WriteOutcome> {
        let document = serde_json::to_value(record)?;
        self.store.insert(T::COLLECTION, document).await
    }

    pub async fn get(&self, id: &DocumentId) -> AppResult<Option<T>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(decode::<T>)
            .transpose()
    }

    /// Like `get`, but a missing record is `AppError::NotFound`
    pub async fn require(&self, id: &DocumentId) -> AppResult<T> {
        self.get(id).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} not found with id: {}", T::COLLECTION, id))
        })
    }

    /// Matching records. Documents that cannot be read as `T` (accepted with
    /// advisory violations) are skipped.
    pub async fn find(&self, query: &DocumentQuery) -> AppResult<Vec<T>> {
        let documents = self.store.find(T::COLLECTION, query).await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| match decode::<T>(document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping unreadable document in {}: {}", T::COLLECTION, e);
                    None
                }
            })
            .collect())
    }

    pub async fn find_one(&self, query: DocumentQuery) -> AppResult<Option<T>> {
        Ok(self.find(&query.limit(1)).await?.into_iter().next())
    }

    pub async fn count(&self, query: &DocumentQuery) -> AppResult<u64> {
        self.store.count(T::COLLECTION, query).await
    }

    pub async fn update(&self, id: &DocumentId, updates: &[Update]) -> AppResult<Option<WriteOutcome>> {
        self.store.update(T::COLLECTION, id, updates).await
    }

    /// Update a record that must exist, returning its new state
    pub async fn modify(&self, id: &DocumentId, updates: &[Update]) -> AppResult<T> {
        if self.update(id, updates).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "{} not found with id: {}",
                T::COLLECTION,
                id
            )));
        }
        self.require(id).await
    }

    pub async fn delete(&self, id: &DocumentId) -> AppResult<bool> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn delete_matching(&self, query: &DocumentQuery) -> AppResult<u64> {
        self.store.delete_matching(T::COLLECTION, query).await
    }

    /// One page of the query's results plus the total match count
    pub async fn page(&self, query: DocumentQuery, request: PageRequest) -> AppResult<PagedResponse<T>> {
        let total = self.count(&query.predicates_only()).await?;
        let content = self
            .find(&query.skip(request.offset()).limit(request.size))
            .await?;
        Ok(PagedResponse::new(content, request, total))
    }
}

fn decode<T: DeserializeOwned>(document: Value) -> AppResult<T> {
    serde_json::from_value(document).map_err(|e| AppError::SerializationError(e.to_string()))
}
