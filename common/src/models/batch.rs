//! Request/response shapes used by the Batch Coordinator and the
//! `/api/markdown` HTTP contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-URL outcome, independent of whether the batch itself succeeded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UrlStatus {
    Processing,
    Completed,
    Failed,
}

/// The result recorded for a single URL within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerUrlResult {
    pub url: String,
    pub status: UrlStatus,
    pub markdown_url: String,
    pub json_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Options controlling collation of successful per-URL reports into a
/// single document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollateOptions {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub add_toc: bool,
    #[serde(default)]
    pub add_source_headers: bool,
}

/// Caller-supplied webhook target for batch completion notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Parsed and validated options for a batch submission, independent of
/// the wire representation accepted by the HTTP façade.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub urls: Vec<String>,
    pub run_async: bool,
    pub collate: bool,
    pub collate_options: Option<CollateOptions>,
    pub webhook: Option<WebhookConfig>,
    /// Per-crawl options forwarded opaquely to the crawler collaborator.
    pub crawl_options: serde_json::Value,
}

pub const MAX_BATCH_URLS: usize = 50;

impl BatchOptions {
    /// Validate cardinality constraints. Per-URL validity is the
    /// crawler collaborator's concern, not the coordinator's.
    pub fn validate(&self) -> Result<(), String> {
        if self.urls.is_empty() {
            return Err("urls must contain at least one entry".to_string());
        }
        if self.urls.len() > MAX_BATCH_URLS {
            return Err(format!(
                "urls exceeds the maximum of {MAX_BATCH_URLS} per batch (got {})",
                self.urls.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(urls: Vec<&str>) -> BatchOptions {
        BatchOptions {
            urls: urls.into_iter().map(str::to_string).collect(),
            run_async: true,
            collate: false,
            collate_options: None,
            webhook: None,
            crawl_options: serde_json::json!({}),
        }
    }

    #[test]
    fn exactly_fifty_urls_is_accepted() {
        let urls: Vec<String> = (0..50).map(|i| format!("https://example.com/{i}")).collect();
        let opts = BatchOptions {
            urls,
            ..options(vec![])
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn fifty_one_urls_is_rejected() {
        let urls: Vec<String> = (0..51).map(|i| format!("https://example.com/{i}")).collect();
        let opts = BatchOptions {
            urls,
            ..options(vec![])
        };
        let err = opts.validate().unwrap_err();
        assert!(err.contains("50"));
    }

    #[test]
    fn empty_urls_is_rejected() {
        assert!(options(vec![]).validate().is_err());
    }
}
