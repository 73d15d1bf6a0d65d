//! Predictable artifact path computation for batch crawls. Paths are
//! derived from `(job_id, index)` alone so clients can start polling them
//! before the corresponding crawl has even started.

use common::models::artifact::{batch_collated_path, batch_data_path, batch_report_path};
use common::models::batch::{PerUrlResult, UrlStatus};

/// The per-URL result set a client sees immediately after submitting an
/// async batch: every URL `processing`, with its final paths already
/// populated.
#[must_use]
pub fn predicted_results(job_id: &str, urls: &[String]) -> Vec<PerUrlResult> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| PerUrlResult {
            url: url.clone(),
            status: UrlStatus::Processing,
            markdown_url: batch_report_path(job_id, i),
            json_url: batch_data_path(job_id, i),
            error: None,
        })
        .collect()
}

#[must_use]
pub fn report_path(job_id: &str, index: usize) -> String {
    batch_report_path(job_id, index)
}

#[must_use]
pub fn data_path(job_id: &str, index: usize) -> String {
    batch_data_path(job_id, index)
}

#[must_use]
pub fn collated_path(job_id: &str) -> String {
    batch_collated_path(job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicted_results_mark_every_url_processing() {
        let urls = vec!["https://a.example".to_string(), "https://b.example".to_string()];
        let results = predicted_results("job-1", &urls);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status == UrlStatus::Processing));
        assert_eq!(results[0].markdown_url, "batch/job-1/report_0.md");
        assert_eq!(results[1].markdown_url, "batch/job-1/report_1.md");
    }
}
