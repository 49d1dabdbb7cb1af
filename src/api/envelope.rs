// Response envelope shared by every endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            timestamp: Some(Utc::now()),
            path: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            timestamp: Some(Utc::now()),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// The payload of a successful envelope
    pub fn into_data(self) -> Option<T> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let envelope = ApiResponse::<()>::error("Blog not found").with_path("/api/v1.0/blogsite/blogs/x");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Blog not found");
        assert_eq!(json["path"], "/api/v1.0/blogsite/blogs/x");
        assert!(json.get("data").is_none());
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_success_envelope_round_trip() {
        let envelope = ApiResponse::success(vec!["a".to_string()], "Categories retrieved");
        let json = serde_json::to_string(&envelope).unwrap();
        let back: ApiResponse<Vec<String>> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_data(), Some(vec!["a".to_string()]));
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Count {
        total: u64,
    }

    fn decode<T: serde::de::DeserializeOwned>(body: &str) -> ApiResponse<T> {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_decode_payload_without_default() {
        let envelope: ApiResponse<Count> =
            decode(r#"{"success":true,"message":"ok","data":{"total":3}}"#);
        assert_eq!(envelope.into_data(), Some(Count { total: 3 }));

        let envelope: ApiResponse<Count> = decode(r#"{"success":false,"message":"Blog not found"}"#);
        assert!(envelope.data.is_none());
        assert!(envelope.timestamp.is_none());
    }
}
