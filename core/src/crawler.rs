//! The crawl engine is an external collaborator: the coordinator drives it
//! through this trait and never depends on a specific browser or fetch
//! implementation. Only the interface is in scope here.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

/// Result of crawling a single URL.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub markdown: String,
    pub title: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("render timed out")]
    Timeout,
}

#[async_trait]
pub trait Crawler: Send + Sync {
    /// Crawl `url`, forwarding `options` (JavaScript toggles, screenshot
    /// mode, content filters) opaquely to the engine. A per-call timeout is
    /// the caller's responsibility; a stuck crawl otherwise blocks its
    /// worker-pool slot indefinitely.
    async fn crawl(&self, url: &str, options: &HashMap<String, Value>) -> Result<CrawlResult, CrawlError>;
}

/// Stub crawler used when no real engine is wired in (tests, local dev
/// without a browser backend). Always fails, so callers exercise the
/// per-URL failure path rather than silently producing empty reports.
pub struct UnconfiguredCrawler;

#[async_trait]
impl Crawler for UnconfiguredCrawler {
    async fn crawl(&self, _url: &str, _options: &HashMap<String, Value>) -> Result<CrawlResult, CrawlError> {
        Err(CrawlError::Fetch("no crawl engine configured".to_string()))
    }
}
