// Document Store Interface - collection-level operations over JSON documents
// The engine enforces unique indexes; validation level decides what happens to bad documents

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::core::strong_types::DocumentId;
use crate::core::validation::Violation;
use crate::ent_schema::{Collection, SchemaRegistry, SortOrder};
use crate::error::{AppError, AppResult};

/// Query predicate over a top-level document field
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Equality; `Value::Null` matches missing or null fields
    Eq(String, Value),
    /// Case-insensitive string equality
    EqIgnoreCase(String, String),
    Gte(String, Value),
    Lte(String, Value),
    /// Array field contains the value
    Contains(String, Value),
    /// Any term appears in any field of the collection's text index
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub filters: Vec<Filter>,
    pub sort: Vec<(String, SortOrder)>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(field.to_string(), value.into()))
    }

    pub fn eq_ignore_case(self, field: &str, value: &str) -> Self {
        self.filter(Filter::EqIgnoreCase(field.to_string(), value.to_string()))
    }

    pub fn gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gte(field.to_string(), value.into()))
    }

    pub fn lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lte(field.to_string(), value.into()))
    }

    pub fn contains(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Contains(field.to_string(), value.into()))
    }

    pub fn text(self, terms: &str) -> Self {
        self.filter(Filter::Text(terms.to_string()))
    }

    pub fn sort_asc(mut self, field: &str) -> Self {
        self.sort.push((field.to_string(), SortOrder::Ascending));
        self
    }

    pub fn sort_desc(mut self, field: &str) -> Self {
        self.sort.push((field.to_string(), SortOrder::Descending));
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Same predicates without ordering or paging, for counts and deletes
    pub fn predicates_only(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            ..Self::default()
        }
    }
}

/// Single-document modification, applied atomically with the others in the same call
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Set(String, Value),
    /// Add to an integer field, treating a missing field as 0
    Inc(String, i64),
    /// Subtract from a counter, stopping at 0
    Dec(String, i64),
    /// Append to an array field unless already present
    Push(String, Value),
    /// Remove every occurrence from an array field
    Pull(String, Value),
}

impl Update {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        Update::Set(field.to_string(), value.into())
    }

    pub fn inc(field: &str, delta: i64) -> Self {
        Update::Inc(field.to_string(), delta)
    }

    pub fn dec(field: &str, amount: i64) -> Self {
        Update::Dec(field.to_string(), amount)
    }

    pub fn push(field: &str, value: impl Into<Value>) -> Self {
        Update::Push(field.to_string(), value.into())
    }

    pub fn pull(field: &str, value: impl Into<Value>) -> Self {
        Update::Pull(field.to_string(), value.into())
    }

    pub fn touch() -> Self {
        Update::set("updated_at", Utc::now().timestamp_millis())
    }
}

/// Apply updates to a document in memory
pub fn apply_updates(document: &mut Value, updates: &[Update]) -> AppResult<()> {
    let object = document.as_object_mut().ok_or_else(|| {
        AppError::Validation("cannot update a document that is not an object".to_string())
    })?;

    for update in updates {
        match update {
            Update::Set(field, value) => {
                object.insert(field.clone(), value.clone());
            }
            Update::Inc(field, delta) => {
                let current = integer_field(object, field)?;
                object.insert(field.clone(), Value::from(current.saturating_add(*delta)));
            }
            Update::Dec(field, amount) => {
                let current = integer_field(object, field)?;
                object.insert(field.clone(), Value::from(current.saturating_sub(*amount).max(0)));
            }
            Update::Push(field, value) => {
                let items = array_field(object, field)?;
                if !items.contains(value) {
                    items.push(value.clone());
                }
            }
            Update::Pull(field, value) => {
                let items = array_field(object, field)?;
                items.retain(|item| item != value);
            }
        }
    }

    Ok(())
}

fn integer_field(object: &Map<String, Value>, field: &str) -> AppResult<i64> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value.as_i64().ok_or_else(|| {
            AppError::Validation(format!("cannot change non-integer field '{}'", field))
        }),
    }
}

fn array_field<'a>(object: &'a mut Map<String, Value>, field: &str) -> AppResult<&'a mut Vec<Value>> {
    let entry = object
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if entry.is_null() {
        *entry = Value::Array(Vec::new());
    }
    entry
        .as_array_mut()
        .ok_or_else(|| AppError::Validation(format!("field '{}' is not an array", field)))
}

/// Result of an accepted write. Advisory collections report violations here.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub id: DocumentId,
    pub violations: Vec<Violation>,
}

impl WriteOutcome {
    /// True when the write was accepted despite failing validation
    pub fn is_flagged(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Document store trait for the content collections
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn registry(&self) -> &SchemaRegistry;

    /// Insert a document, assigning an `id` when absent.
    /// Unique index conflicts fail with `AppError::AlreadyExists`.
    async fn insert(&self, collection: Collection, document: Value) -> AppResult<WriteOutcome>;

    async fn get(&self, collection: Collection, id: &DocumentId) -> AppResult<Option<Value>>;

    async fn find(&self, collection: Collection, query: &DocumentQuery) -> AppResult<Vec<Value>>;

    /// Number of matching documents, ignoring sort, skip and limit
    async fn count(&self, collection: Collection, query: &DocumentQuery) -> AppResult<u64>;

    /// Apply updates to one document. `Ok(None)` when the document does not exist.
    async fn update(
        &self,
        collection: Collection,
        id: &DocumentId,
        updates: &[Update],
    ) -> AppResult<Option<WriteOutcome>>;

    async fn delete(&self, collection: Collection, id: &DocumentId) -> AppResult<bool>;

    /// Delete every matching document, returning how many were removed
    async fn delete_matching(&self, collection: Collection, query: &DocumentQuery) -> AppResult<u64>;

    /// Remove documents past the TTL of every expiring index
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
