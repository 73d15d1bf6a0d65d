//! Artifact entity: an immutable blob addressable by a stable logical path.

use serde::{Deserialize, Serialize};

/// Metadata describing a stored artifact. Content bytes themselves flow
/// through the Artifact Store directly; this type is what gets surfaced
/// to callers alongside a logical path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub logical_path: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Build the logical path for the `i`-th URL's markdown report in a batch.
/// Stable by construction: the same `(job_id, index)` always produces the
/// same path, which is what lets the batch coordinator pre-announce paths
/// before the crawl that produces them has even started.
#[must_use]
pub fn batch_report_path(job_id: &str, index: usize) -> String {
    format!("batch/{job_id}/report_{index}.md")
}

/// Build the logical path for the `i`-th URL's JSON record in a batch.
#[must_use]
pub fn batch_data_path(job_id: &str, index: usize) -> String {
    format!("batch/{job_id}/data_{index}.json")
}

/// Build the logical path for a batch's collated report, if requested.
#[must_use]
pub fn batch_collated_path(job_id: &str) -> String {
    format!("batch/{job_id}/collated.md")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_stable_given_same_inputs() {
        assert_eq!(batch_report_path("j1", 0), batch_report_path("j1", 0));
        assert_eq!(batch_report_path("j1", 0), "batch/j1/report_0.md");
        assert_eq!(batch_data_path("j1", 2), "batch/j1/data_2.json");
        assert_eq!(batch_collated_path("j1"), "batch/j1/collated.md");
    }

    #[test]
    fn distinct_indices_produce_distinct_paths() {
        assert_ne!(batch_report_path("j1", 0), batch_report_path("j1", 1));
    }
}
