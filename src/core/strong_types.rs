// Strong Types - newtypes for identifiers shared by every collection

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::infrastructure::id_generator::global_id_generator;

/// Identifier of a stored document. Generated ids are 16 lowercase hex digits
/// and sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id from the process-wide generator
    pub fn generate() -> Self {
        global_id_generator().next_id()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// User id from the external identity system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Current time truncated to millisecond precision, the resolution timestamps are stored at
pub fn now_millis_precision() -> DateTime<Utc> {
    from_millis(Utc::now().timestamp_millis())
}

pub fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_serializes_as_plain_string() {
        let id = DocumentId::new("00a1b2c3d4e5f607");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"00a1b2c3d4e5f607\"");
        let back: DocumentId = serde_json::from_str("\"00a1b2c3d4e5f607\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_user_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&UserId(42)).unwrap(), "42");
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 16);
    }

    #[test]
    fn test_millis_round_trip() {
        let now = now_millis_precision();
        assert_eq!(from_millis(now.timestamp_millis()), now);
    }
}
