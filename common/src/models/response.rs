//! Response envelopes for the HTTP façade (§6 of the system design). These
//! types are serialized directly as JSON response bodies; the façade layer
//! owns routing and status codes, this crate only owns shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::batch::PerUrlResult;

/// Generic success/error envelope used by simple endpoints
/// (`/api/upload-async`, task-handler responses).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, Value>,
}

impl ApiResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
            extra: HashMap::new(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(message.into()),
            extra: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), v);
        }
        self
    }
}

/// Body of `GET /api/jobs/<job_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: String,
    pub job_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_started_at: Option<DateTime<Utc>>,
}

/// Body of the synchronous batch response (`mode: "batch_sync"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSyncResponse {
    pub success: bool,
    pub mode: &'static str,
    pub results: Vec<PerUrlResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collated_url: Option<String>,
}

/// Body of the asynchronous batch response (`mode: "batch_async"`, HTTP 202).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAsyncResponse {
    pub success: bool,
    pub mode: &'static str,
    pub job_id: String,
    pub status_url: String,
    pub results: Vec<PerUrlResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collated_url: Option<String>,
}

/// Body of the legacy single-URL synchronous response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleCrawlResponse {
    pub success: bool,
    pub url: String,
    pub markdown: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_serializes_without_error_field() {
        let response = ApiResponse::ok().with("job_id", "job-1");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
        assert_eq!(json["job_id"], "job-1");
    }

    #[test]
    fn error_response_carries_message() {
        let response = ApiResponse::error("urls must not exceed 50");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "urls must not exceed 50");
    }
}
