// Core types and primitives

pub mod strong_types;
pub mod validation;

pub use strong_types::{DocumentId, UserId};
pub use validation::{validate_document, Violation, ViolationKind};
