// SQLite Document Store - JSON documents in per-collection tables with expression indexes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::{QueryBuilder, Row};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::core::strong_types::DocumentId;
use crate::core::validation::{describe, validate_document, Violation};
use crate::ent_schema::{
    Collection, CollectionDefinition, IndexDefinition, IndexKind, SchemaRegistry, SortOrder,
    ValidationLevel,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{
    apply_updates, DocumentQuery, DocumentStore, Filter, Update, WriteOutcome,
};
use crate::schemas::create_schema_registry;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// SQLite implementation of the document store.
/// One table per collection holding JSON documents; schema indexes become
/// expression indexes over `json_extract`.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    registry: SchemaRegistry,
    /// Serializes read-modify-write updates
    write_lock: Mutex<()>,
}

impl SqliteDocumentStore {
    pub async fn connect(
        url: &str,
        max_connections: u32,
        registry: SchemaRegistry,
    ) -> AppResult<Self> {
        registry
            .validate()
            .map_err(|errors| AppError::ConfigurationError(errors.join("; ")))?;

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid database URL '{}': {}", url, e))
            })?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            // Each connection to :memory: is a separate database, keep exactly one alive
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to '{}': {}", url, e))
        })?;

        let store = Self {
            pool,
            registry,
            write_lock: Mutex::new(()),
        };
        store.initialize().await?;

        info!("Document store ready at {}", url);
        Ok(store)
    }

    /// Fresh in-memory store with the standard schema
    pub async fn in_memory() -> AppResult<Self> {
        Self::in_memory_with_registry(create_schema_registry()).await
    }

    pub async fn in_memory_with_registry(registry: SchemaRegistry) -> AppResult<Self> {
        Self::connect("sqlite::memory:", 1, registry).await
    }

    /// Create collection tables and materialize indexes
    async fn initialize(&self) -> AppResult<()> {
        for definition in self.registry.definitions() {
            let table = definition.collection.as_str();

            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY NOT NULL, doc TEXT NOT NULL CHECK (json_valid(doc)))",
                table
            ))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create table {}: {}", table, e))
            })?;

            for index in &definition.indexes {
                match index_ddl(table, index)? {
                    Some(ddl) => {
                        sqlx::query(&ddl).execute(&self.pool).await.map_err(|e| {
                            AppError::DatabaseError(format!(
                                "Failed to create index {}: {}",
                                index.name, e
                            ))
                        })?;
                    }
                    None => debug!(
                        "Index {} on {} ({:?}) is declared but not materialized",
                        index.name, table, index.kind
                    ),
                }
            }
        }

        Ok(())
    }

    async fn read_modify_write(
        &self,
        conn: &mut SqliteConnection,
        definition: &CollectionDefinition,
        id: &DocumentId,
        updates: &[Update],
    ) -> AppResult<Option<WriteOutcome>> {
        let collection = definition.collection;
        let table = collection.as_str();

        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = ?", table))
            .bind(id.as_str().to_string())
            .fetch_optional(&mut *conn)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut document = decode_row(&row)?;
        apply_updates(&mut document, updates)?;
        if let Some(object) = document.as_object_mut() {
            object.insert("id".to_string(), Value::String(id.to_string()));
        }

        let violations = validate_document(definition, &document);
        self.enforce(definition, id, &violations)?;

        sqlx::query(&format!("UPDATE {} SET doc = ? WHERE id = ?", table))
            .bind(serde_json::to_string(&document)?)
            .bind(id.as_str().to_string())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_write_error(collection, e))?;

        Ok(Some(WriteOutcome {
            id: id.clone(),
            violations,
        }))
    }

    fn definition(&self, collection: Collection) -> AppResult<&CollectionDefinition> {
        self.registry.get(collection).ok_or_else(|| {
            AppError::ConfigurationError(format!("Collection '{}' is not registered", collection))
        })
    }

    /// Strict collections reject, advisory collections log and continue
    fn enforce(
        &self,
        definition: &CollectionDefinition,
        id: &DocumentId,
        violations: &[Violation],
    ) -> AppResult<()> {
        if violations.is_empty() {
            return Ok(());
        }

        match definition.validation_level {
            ValidationLevel::Strict => Err(AppError::Validation(format!(
                "Document rejected by '{}': {}",
                definition.collection,
                describe(violations)
            ))),
            ValidationLevel::Advisory => {
                warn!(
                    "Document {} in '{}' failed validation: {}",
                    id,
                    definition.collection,
                    describe(violations)
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    async fn insert(&self, collection: Collection, document: Value) -> AppResult<WriteOutcome> {
        let definition = self.definition(collection)?;
        let mut document = document;
        let id = ensure_id(&mut document)?;

        let violations = validate_document(definition, &document);
        self.enforce(definition, &id, &violations)?;

        sqlx::query(&format!("INSERT INTO {} (id, doc) VALUES (?, ?)", collection.as_str()))
            .bind(id.as_str().to_string())
            .bind(serde_json::to_string(&document)?)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(collection, e))?;

        debug!("Inserted {} into {}", id, collection);
        Ok(WriteOutcome { id, violations })
    }

    async fn get(&self, collection: Collection, id: &DocumentId) -> AppResult<Option<Value>> {
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = ?", collection.as_str()))
            .bind(id.as_str().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to get {} from {}: {}", id, collection, e))
            })?;

        row.map(|row| decode_row(&row)).transpose()
    }

    async fn find(&self, collection: Collection, query: &DocumentQuery) -> AppResult<Vec<Value>> {
        let definition = self.definition(collection)?;
        let table = collection.as_str();

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT doc FROM {}", table));
        push_where(&mut qb, definition, &query.filters)?;
        push_order(&mut qb, &query.sort)?;
        qb.push(" LIMIT ");
        // SQLite takes signed 64-bit bounds; -1 means no limit
        qb.push_bind(query.limit.map(clamp_to_i64).unwrap_or(-1));
        qb.push(" OFFSET ");
        qb.push_bind(clamp_to_i64(query.skip));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to query {}: {}", table, e)))?;

        rows.iter().map(decode_row).collect()
    }

    async fn count(&self, collection: Collection, query: &DocumentQuery) -> AppResult<u64> {
        let definition = self.definition(collection)?;
        let table = collection.as_str();

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) AS n FROM {}", table));
        push_where(&mut qb, definition, &query.filters)?;

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count {}: {}", table, e)))?;

        Ok(row.try_get::<i64, _>("n")?.max(0) as u64)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &DocumentId,
        updates: &[Update],
    ) -> AppResult<Option<WriteOutcome>> {
        let definition = self.definition(collection)?;
        let table = collection.as_str();

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        // A write as the first statement takes the database write lock now,
        // so the read below cannot be overtaken by another connection
        sqlx::query(&format!("UPDATE {} SET doc = doc WHERE id = ?", table))
            .bind(id.as_str().to_string())
            .execute(&mut *tx)
            .await?;

        let outcome = self.read_modify_write(&mut *tx, definition, id, updates).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn delete(&self, collection: Collection, id: &DocumentId) -> AppResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", collection.as_str()))
            .bind(id.as_str().to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to delete {} from {}: {}", id, collection, e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_matching(&self, collection: Collection, query: &DocumentQuery) -> AppResult<u64> {
        let definition = self.definition(collection)?;
        let table = collection.as_str();

        let mut qb = QueryBuilder::<Sqlite>::new(format!("DELETE FROM {}", table));
        push_where(&mut qb, definition, &query.filters)?;

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete from {}: {}", table, e)))?;

        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut purged = 0;

        for definition in self.registry.definitions() {
            for (field, ttl) in definition.ttl_rules() {
                let ttl = chrono::Duration::from_std(ttl)
                    .map_err(|e| AppError::ConfigurationError(format!("Invalid TTL: {}", e)))?;
                let cutoff = (now - ttl).timestamp_millis();

                let result = sqlx::query(&format!(
                    "DELETE FROM {} WHERE {} < ?",
                    definition.collection.as_str(),
                    field_expr(field)?
                ))
                .bind(cutoff)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!(
                        "Failed to purge {}: {}",
                        definition.collection, e
                    ))
                })?;

                if result.rows_affected() > 0 {
                    info!(
                        "Purged {} expired documents from {}",
                        result.rows_affected(),
                        definition.collection
                    );
                }
                purged += result.rows_affected();
            }
        }

        Ok(purged)
    }
}

/// Use the document's `id` or assign a generated one
fn ensure_id(document: &mut Value) -> AppResult<DocumentId> {
    let object = document
        .as_object_mut()
        .ok_or_else(|| AppError::Validation("document must be an object".to_string()))?;

    match object.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(DocumentId::new(id.clone())),
        None | Some(Value::Null) => {
            let id = DocumentId::generate();
            object.insert("id".to_string(), Value::String(id.to_string()));
            Ok(id)
        }
        Some(other) => Err(AppError::Validation(format!(
            "document id must be a non-empty string, got {}",
            other
        ))),
    }
}

fn decode_row(row: &sqlx::sqlite::SqliteRow) -> AppResult<Value> {
    let doc: String = row.try_get("doc")?;
    Ok(serde_json::from_str(&doc)?)
}

fn map_write_error(collection: Collection, err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::AlreadyExists(
            format!("Duplicate key in '{}': {}", collection, db_err.message()),
        ),
        _ => AppError::DatabaseError(format!("Write to '{}' failed: {}", collection, err)),
    }
}

fn check_identifier(name: &str) -> AppResult<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(AppError::BadRequest(format!("Invalid field name '{}'", name)))
    }
}

/// SQL expression for a top-level field. Must match the index expressions exactly.
fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn field_expr(field: &str) -> AppResult<String> {
    Ok(format!("json_extract(doc, '$.{}')", check_identifier(field)?))
}

fn index_ddl(table: &str, index: &IndexDefinition) -> AppResult<Option<String>> {
    if index.kind != IndexKind::Standard {
        return Ok(None);
    }

    let columns = index
        .keys
        .iter()
        .map(|key| {
            let direction = match key.order {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            };
            let expr = field_expr(&key.field)?;
            if index.ignore_case {
                Ok(format!("lower({}) {}", expr, direction))
            } else {
                Ok(format!("{} {}", expr, direction))
            }
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Some(format!(
        "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        check_identifier(&index.name)?,
        table,
        columns.join(", ")
    )))
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Null => {
            qb.push_bind(Option::<i64>::None);
        }
        Value::Bool(b) => {
            qb.push_bind(*b);
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                qb.push_bind(i);
            }
            None => {
                qb.push_bind(n.as_f64().unwrap_or_default());
            }
        },
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        other => {
            qb.push_bind(other.to_string());
        }
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_where(
    qb: &mut QueryBuilder<'_, Sqlite>,
    definition: &CollectionDefinition,
    filters: &[Filter],
) -> AppResult<()> {
    qb.push(" WHERE 1 = 1");

    for filter in filters {
        match filter {
            Filter::Eq(field, Value::Null) => {
                qb.push(" AND ").push(field_expr(field)?).push(" IS NULL");
            }
            Filter::Eq(field, value) => {
                qb.push(" AND ").push(field_expr(field)?).push(" = ");
                push_value(qb, value);
            }
            Filter::EqIgnoreCase(field, value) => {
                qb.push(" AND lower(").push(field_expr(field)?).push(") = lower(");
                qb.push_bind(value.clone());
                qb.push(")");
            }
            Filter::Gte(field, value) => {
                qb.push(" AND ").push(field_expr(field)?).push(" >= ");
                push_value(qb, value);
            }
            Filter::Lte(field, value) => {
                qb.push(" AND ").push(field_expr(field)?).push(" <= ");
                push_value(qb, value);
            }
            Filter::Contains(field, value) => {
                qb.push(format!(
                    " AND EXISTS (SELECT 1 FROM json_each({}.doc, '$.{}') AS elem WHERE elem.value = ",
                    definition.collection.as_str(),
                    check_identifier(field)?
                ));
                push_value(qb, value);
                qb.push(")");
            }
            Filter::Text(terms) => {
                let fields = definition.text_fields().ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Collection '{}' has no text index",
                        definition.collection
                    ))
                })?;
                let terms: Vec<&str> = terms.split_whitespace().collect();
                if terms.is_empty() {
                    return Err(AppError::BadRequest("Search terms must not be empty".to_string()));
                }

                qb.push(" AND (");
                let mut first = true;
                for term in &terms {
                    for field in &fields {
                        if !first {
                            qb.push(" OR ");
                        }
                        first = false;
                        qb.push(field_expr(field)?).push(" LIKE ");
                        qb.push_bind(escape_like(term));
                        qb.push(" ESCAPE '\\'");
                    }
                }
                qb.push(")");
            }
        }
    }

    Ok(())
}

fn push_order(qb: &mut QueryBuilder<'_, Sqlite>, sort: &[(String, SortOrder)]) -> AppResult<()> {
    qb.push(" ORDER BY ");
    for (field, order) in sort {
        qb.push(field_expr(field)?).push(match order {
            SortOrder::Ascending => " ASC, ",
            SortOrder::Descending => " DESC, ",
        });
    }

    // Ids are time-ordered, so they break ties in the direction of the last key
    let tie_break = match sort.last() {
        Some((_, SortOrder::Descending)) => "id DESC",
        _ => "id ASC",
    };
    qb.push(tie_break);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ent_schema::IndexKey;

    #[test]
    fn test_index_ddl() {
        let index = IndexDefinition::with_keys(
            "idx_posts_published",
            vec![IndexKey::asc("is_published"), IndexKey::desc("created_at")],
        );
        assert_eq!(
            index_ddl("posts", &index).unwrap().unwrap(),
            "CREATE INDEX IF NOT EXISTS idx_posts_published ON posts \
             (json_extract(doc, '$.is_published') ASC, json_extract(doc, '$.created_at') DESC)"
        );

        let unique = IndexDefinition::new("idx_tags_name_unique", vec!["name"]).unique();
        assert!(index_ddl("tags", &unique)
            .unwrap()
            .unwrap()
            .starts_with("CREATE UNIQUE INDEX"));

        let folded = IndexDefinition::new("idx_categories_name_ci_unique", vec!["name"])
            .unique()
            .ignore_case();
        assert_eq!(
            index_ddl("categories", &folded).unwrap().unwrap(),
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_name_ci_unique ON categories \
             (lower(json_extract(doc, '$.name')) ASC)"
        );

        let text = IndexDefinition::new("idx_text", vec!["title"]).text();
        assert_eq!(index_ddl("posts", &text).unwrap(), None);
    }

    #[test]
    fn test_field_names_are_checked() {
        assert!(field_expr("created_at").is_ok());
        assert!(matches!(
            field_expr("x') OR 1=1 --"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_like_patterns_are_escaped() {
        assert_eq!(escape_like("rust"), "%rust%");
        assert_eq!(escape_like("100%_done"), "%100\\%\\_done%");
    }

    #[test]
    fn test_ensure_id() {
        let mut doc = serde_json::json!({"name": "x"});
        let id = ensure_id(&mut doc).unwrap();
        assert_eq!(doc["id"], Value::String(id.to_string()));

        let mut doc = serde_json::json!({"id": "abc"});
        assert_eq!(ensure_id(&mut doc).unwrap(), DocumentId::new("abc"));

        let mut doc = serde_json::json!({"id": 5});
        assert!(ensure_id(&mut doc).is_err());
    }
}
