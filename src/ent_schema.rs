// Collection Schema Framework - schema-as-code for the content store
// Each collection declares its fields, validators, indexes and validation level

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Duration;

/// The six collections of the content store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Posts,
    Categories,
    Comments,
    Tags,
    Likes,
    Notifications,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Posts,
        Collection::Categories,
        Collection::Comments,
        Collection::Tags,
        Collection::Likes,
        Collection::Notifications,
    ];

    /// Storage name, also used as the table name
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Categories => "categories",
            Collection::Comments => "comments",
            Collection::Tags => "tags",
            Collection::Likes => "likes",
            Collection::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a collection reacts to a document that fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    /// Violations are logged and reported, the write proceeds
    Advisory,
    /// Violations reject the write
    Strict,
}

/// Schema definition trait - one implementation per collection
pub trait CollectionSchema: Send + Sync {
    fn collection() -> Collection
    where
        Self: Sized;

    fn fields() -> Vec<FieldDefinition>
    where
        Self: Sized;

    fn indexes() -> Vec<IndexDefinition>
    where
        Self: Sized,
    {
        Vec::new()
    }

    fn validation_level() -> ValidationLevel
    where
        Self: Sized,
    {
        ValidationLevel::Advisory
    }

    /// Materialize the schema into a registry entry
    fn definition() -> CollectionDefinition
    where
        Self: Sized,
    {
        CollectionDefinition {
            collection: Self::collection(),
            validation_level: Self::validation_level(),
            fields: Self::fields(),
            indexes: Self::indexes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    /// Optional fields may be absent
    pub optional: bool,
    /// Nullable fields may hold an explicit null
    pub nullable: bool,
    pub validators: Vec<FieldValidator>,
    pub description: String,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            optional: false,
            nullable: false,
            validators: Vec::new(),
            description: String::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn validate(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn is_required(&self) -> bool {
        !self.optional
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Int64,
    Bool,
    /// Epoch milliseconds, UTC
    Date,
    StringArray,
    Enum(Vec<String>),
}

impl FieldType {
    pub fn enumeration(values: &[&str]) -> Self {
        FieldType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int64 => "long",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::StringArray => "array<string>",
            FieldType::Enum(_) => "enum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValidator {
    /// Minimum length in characters
    MinLength(usize),
    MaxLength(usize),
    /// Inclusive lower bound for numeric fields
    Minimum(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    pub order: SortOrder,
}

impl IndexKey {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Standard,
    /// Full-text over the key fields
    Text,
    /// Index over the elements of an array field
    MultiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub keys: Vec<IndexKey>,
    pub kind: IndexKind,
    pub unique: bool,
    /// Keys compare lowercased, so "Rust" and "rust" collide under `unique`
    #[serde(default)]
    pub ignore_case: bool,
    /// Documents whose first key is older than this are removed by the TTL sweep
    pub expire_after_secs: Option<u64>,
}

impl IndexDefinition {
    /// Index over the given fields, all ascending
    pub fn new(name: &str, fields: Vec<&str>) -> Self {
        Self::with_keys(name, fields.into_iter().map(IndexKey::asc).collect())
    }

    pub fn with_keys(name: &str, keys: Vec<IndexKey>) -> Self {
        Self {
            name: name.to_string(),
            keys,
            kind: IndexKind::Standard,
            unique: false,
            ignore_case: false,
            expire_after_secs: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn text(mut self) -> Self {
        self.kind = IndexKind::Text;
        self
    }

    pub fn multi_key(mut self) -> Self {
        self.kind = IndexKind::MultiKey;
        self
    }

    pub fn expire_after(mut self, ttl: Duration) -> Self {
        self.expire_after_secs = Some(ttl.as_secs());
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.expire_after_secs.map(Duration::from_secs)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.field.as_str())
    }
}

/// A collection's full schema as stored in the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDefinition {
    pub collection: Collection,
    pub validation_level: ValidationLevel,
    pub fields: Vec<FieldDefinition>,
    pub indexes: Vec<IndexDefinition>,
}

impl CollectionDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.is_required())
    }

    /// Fields covered by the collection's text index, if it has one
    pub fn text_fields(&self) -> Option<Vec<&str>> {
        self.indexes
            .iter()
            .find(|idx| idx.kind == IndexKind::Text)
            .map(|idx| idx.field_names().collect())
    }

    /// (field, ttl) pairs of TTL indexes
    pub fn ttl_rules(&self) -> Vec<(&str, Duration)> {
        self.indexes
            .iter()
            .filter_map(|idx| {
                let ttl = idx.ttl()?;
                let field = idx.keys.first()?;
                Some((field.field.as_str(), ttl))
            })
            .collect()
    }
}

/// Schema registry - holds all defined collections
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    definitions: BTreeMap<Collection, CollectionDefinition>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: CollectionSchema + 'static>(&mut self) {
        let definition = T::definition();
        self.definitions.insert(definition.collection, definition);
    }

    pub fn get(&self, collection: Collection) -> Option<&CollectionDefinition> {
        self.definitions.get(&collection)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &CollectionDefinition> {
        self.definitions.values()
    }

    /// Override a collection's validation level
    pub fn with_validation_level(mut self, collection: Collection, level: ValidationLevel) -> Self {
        if let Some(definition) = self.definitions.get_mut(&collection) {
            definition.validation_level = level;
        }
        self
    }

    /// Validate schema consistency
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for definition in self.definitions.values() {
            let declared: HashSet<&str> = definition.fields.iter().map(|f| f.name.as_str()).collect();
            let mut index_names = HashSet::new();

            for index in &definition.indexes {
                if !index_names.insert(index.name.as_str()) {
                    errors.push(format!(
                        "Collection '{}' declares index '{}' twice",
                        definition.collection, index.name
                    ));
                }
                if index.keys.is_empty() {
                    errors.push(format!(
                        "Index '{}' on '{}' has no keys",
                        index.name, definition.collection
                    ));
                }
                for field in index.field_names() {
                    if !declared.contains(field) {
                        errors.push(format!(
                            "Index '{}' on '{}' references undeclared field '{}'",
                            index.name, definition.collection, field
                        ));
                    }
                }
                if index.expire_after_secs.is_some() && index.keys.len() != 1 {
                    errors.push(format!(
                        "TTL index '{}' on '{}' must have exactly one key",
                        index.name, definition.collection
                    ));
                }
            }

            let text_indexes = definition
                .indexes
                .iter()
                .filter(|idx| idx.kind == IndexKind::Text)
                .count();
            if text_indexes > 1 {
                errors.push(format!(
                    "Collection '{}' has {} text indexes, at most one is allowed",
                    definition.collection, text_indexes
                ));
            }

            let mut field_names = HashSet::new();
            for field in &definition.fields {
                if !field_names.insert(field.name.as_str()) {
                    errors.push(format!(
                        "Collection '{}' declares field '{}' twice",
                        definition.collection, field.name
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
