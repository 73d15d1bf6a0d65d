//! Payload shape posted to a caller-supplied webhook URL on batch
//! completion.

use serde::{Deserialize, Serialize};

use super::batch::PerUrlResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookStats {
    pub total_urls: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub job_id: String,
    pub status: String,
    pub stats: WebhookStats,
    pub results: Vec<PerUrlResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl WebhookStats {
    #[must_use]
    pub fn from_results(results: &[PerUrlResult]) -> Self {
        use super::batch::UrlStatus;

        let successful = results
            .iter()
            .filter(|r| r.status == UrlStatus::Completed)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == UrlStatus::Failed)
            .count();

        Self {
            total_urls: results.len(),
            successful,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::batch::UrlStatus;
    use super::*;

    #[test]
    fn stats_count_each_status_bucket() {
        let results = vec![
            PerUrlResult {
                url: "https://a".into(),
                status: UrlStatus::Completed,
                markdown_url: "batch/j/report_0.md".into(),
                json_url: "batch/j/data_0.json".into(),
                error: None,
            },
            PerUrlResult {
                url: "https://b".into(),
                status: UrlStatus::Failed,
                markdown_url: "batch/j/report_1.md".into(),
                json_url: "batch/j/data_1.json".into(),
                error: Some("timeout".into()),
            },
        ];

        let stats = WebhookStats::from_results(&results);
        assert_eq!(stats.total_urls, 2);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 1);
    }
}
