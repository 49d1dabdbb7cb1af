// Document validation against a collection definition

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::ent_schema::{CollectionDefinition, FieldDefinition, FieldType, FieldValidator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    NotAnObject,
    MissingField,
    TypeMismatch { expected: String },
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
    BelowMinimum { min: i64, actual: i64 },
    NotInEnum { allowed: Vec<String> },
}

/// One failed rule on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl Violation {
    fn new(field: &str, kind: ViolationKind) -> Self {
        Self {
            field: field.to_string(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::NotAnObject => write!(f, "document must be an object"),
            ViolationKind::MissingField => write!(f, "{} is mandatory", self.field),
            ViolationKind::TypeMismatch { expected } => {
                write!(f, "{} must be of type {}", self.field, expected)
            }
            ViolationKind::TooShort { min, actual } => write!(
                f,
                "{} must be at least {} characters (got {})",
                self.field, min, actual
            ),
            ViolationKind::TooLong { max, actual } => write!(
                f,
                "{} must be at most {} characters (got {})",
                self.field, max, actual
            ),
            ViolationKind::BelowMinimum { min, actual } => {
                write!(f, "{} must be >= {} (got {})", self.field, min, actual)
            }
            ViolationKind::NotInEnum { allowed } => {
                write!(f, "{} must be one of [{}]", self.field, allowed.join(", "))
            }
        }
    }
}

/// Join violations into a single human-readable message
pub fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a document against its collection definition. Unknown fields are allowed.
pub fn validate_document(definition: &CollectionDefinition, document: &Value) -> Vec<Violation> {
    let Some(object) = document.as_object() else {
        return vec![Violation::new("", ViolationKind::NotAnObject)];
    };

    definition
        .fields
        .iter()
        .flat_map(|field| validate_field(field, object))
        .collect()
}

fn validate_field(field: &FieldDefinition, object: &Map<String, Value>) -> Vec<Violation> {
    let value = match object.get(&field.name) {
        None => {
            return if field.is_required() {
                vec![Violation::new(&field.name, ViolationKind::MissingField)]
            } else {
                Vec::new()
            };
        }
        Some(Value::Null) if field.nullable => return Vec::new(),
        Some(Value::Null) if field.is_required() => {
            return vec![Violation::new(&field.name, ViolationKind::MissingField)];
        }
        Some(value) => value,
    };

    if let Some(violation) = check_type(field, value) {
        return vec![violation];
    }

    field
        .validators
        .iter()
        .filter_map(|validator| check_validator(&field.name, validator, value))
        .collect()
}

fn check_type(field: &FieldDefinition, value: &Value) -> Option<Violation> {
    let matches = match &field.field_type {
        FieldType::String => value.is_string(),
        FieldType::Int64 | FieldType::Date => value.is_i64(),
        FieldType::Bool => value.is_boolean(),
        FieldType::StringArray => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldType::Enum(allowed) => {
            return match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => None,
                _ => Some(Violation::new(
                    &field.name,
                    ViolationKind::NotInEnum {
                        allowed: allowed.clone(),
                    },
                )),
            };
        }
    };

    if matches {
        None
    } else {
        Some(Violation::new(
            &field.name,
            ViolationKind::TypeMismatch {
                expected: field.field_type.name().to_string(),
            },
        ))
    }
}

fn check_validator(field: &str, validator: &FieldValidator, value: &Value) -> Option<Violation> {
    match validator {
        FieldValidator::MinLength(min) => {
            let actual = value.as_str()?.chars().count();
            (actual < *min).then(|| Violation::new(field, ViolationKind::TooShort { min: *min, actual }))
        }
        FieldValidator::MaxLength(max) => {
            let actual = value.as_str()?.chars().count();
            (actual > *max).then(|| Violation::new(field, ViolationKind::TooLong { max: *max, actual }))
        }
        FieldValidator::Minimum(min) => {
            let actual = value.as_i64()?;
            (actual < *min)
                .then(|| Violation::new(field, ViolationKind::BelowMinimum { min: *min, actual }))
        }
    }
}
