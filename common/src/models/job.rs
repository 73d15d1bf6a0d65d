//! Job entity: a long-lived, persisted unit of work tracked through a
//! state machine by the Job Store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Tagged variant identifying what kind of work a job represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    ImageProcessing,
    BatchCrawl,
    SingleCrawl,
    Cleanup,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobType::ImageProcessing => "image-processing",
            JobType::BatchCrawl => "batch-crawl",
            JobType::SingleCrawl => "single-crawl",
            JobType::Cleanup => "cleanup",
        };
        write!(f, "{s}")
    }
}

/// Job lifecycle status. `Completed`, `Failed`, `Deleted` and `CleanedUp`
/// are terminal: once reached, a job never transitions out of them again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Deleted,
    CleanedUp,
}

impl JobStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Deleted | JobStatus::CleanedUp
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Deleted => "deleted",
            JobStatus::CleanedUp => "cleaned_up",
        };
        write!(f, "{s}")
    }
}

/// A long-lived, persisted unit of work, visible to clients by id.
///
/// Owned exclusively by the Job Store: handlers and the batch coordinator
/// mutate a job only through the store's `update`, never by constructing
/// and overwriting a record directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Opaque data supplied at creation: input paths, titles, URL lists,
    /// webhook configuration, forwarded crawl options.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,

    /// Populated on completion: artifact paths, stats, timings.
    #[serde(default)]
    pub results: HashMap<String, Value>,

    /// Set iff `status == Failed`.
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub processing_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cleaned_up_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new job, status `pending`, with a freshly generated id.
    #[must_use]
    pub fn new(job_type: JobType, metadata: HashMap<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4().to_string(),
            job_type,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            metadata,
            results: HashMap::new(),
            error: None,
            processing_started_at: None,
            completed_at: None,
            failed_at: None,
            deleted_at: None,
            cleaned_up_at: None,
        }
    }

    /// Apply a partial update in place, honoring the terminal-state
    /// invariant: once a job reaches a terminal status, further status
    /// changes are ignored (the rest of the patch still applies).
    pub fn apply_patch(&mut self, patch: JobPatch) {
        if let Some(status) = patch.status {
            if !self.status.is_terminal() {
                self.status = status;
            }
        }
        if let Some(metadata) = patch.metadata {
            self.metadata.extend(metadata);
        }
        if let Some(results) = patch.results {
            self.results.extend(results);
        }
        if patch.error.is_some() {
            self.error = patch.error;
        }
        if patch.processing_started_at.is_some() {
            self.processing_started_at = patch.processing_started_at;
        }
        if patch.completed_at.is_some() {
            self.completed_at = patch.completed_at;
        }
        if patch.failed_at.is_some() {
            self.failed_at = patch.failed_at;
        }
        if patch.deleted_at.is_some() {
            self.deleted_at = patch.deleted_at;
        }
        if patch.cleaned_up_at.is_some() {
            self.cleaned_up_at = patch.cleaned_up_at;
        }

        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at
        };
    }
}

/// A partial update applied to a [`Job`] by the Job Store's `update`
/// operation. Fields left `None` are preserved; `metadata`/`results` merge
/// at the key level rather than replacing the map wholesale.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub metadata: Option<HashMap<String, Value>>,
    pub results: Option<HashMap<String, Value>>,
    pub error: Option<String>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub cleaned_up_at: Option<DateTime<Utc>>,
}

impl JobPatch {
    #[must_use]
    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn results(mut self, results: HashMap<String, Value>) -> Self {
        self.results = Some(results);
        self
    }

    #[must_use]
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn completed_now(mut self) -> Self {
        self.completed_at = Some(Utc::now());
        self
    }

    #[must_use]
    pub fn failed_now(mut self) -> Self {
        self.failed_at = Some(Utc::now());
        self
    }

    #[must_use]
    pub fn processing_started_now(mut self) -> Self {
        self.processing_started_at = Some(Utc::now());
        self
    }

    #[must_use]
    pub fn deleted_now(mut self) -> Self {
        self.deleted_at = Some(Utc::now());
        self
    }

    #[must_use]
    pub fn cleaned_up_now(mut self) -> Self {
        self.cleaned_up_at = Some(Utc::now());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_starts_pending() {
        let job = Job::new(JobType::BatchCrawl, HashMap::new());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.created_at, job.updated_at);
        assert!(job.results.is_empty());
    }

    #[test]
    fn terminal_status_cannot_be_left() {
        let mut job = Job::new(JobType::SingleCrawl, HashMap::new());
        job.apply_patch(JobPatch::default().status(JobStatus::Completed).completed_now());
        assert_eq!(job.status, JobStatus::Completed);

        // A later patch trying to move it back to `processing` is ignored.
        job.apply_patch(JobPatch::default().status(JobStatus::Processing));
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn patch_merges_metadata_and_results_at_key_level() {
        let mut metadata = HashMap::new();
        metadata.insert("title".to_string(), Value::String("a".into()));
        let mut job = Job::new(JobType::ImageProcessing, metadata);

        let mut results = HashMap::new();
        results.insert("report_path".to_string(), Value::String("r.md".into()));
        job.apply_patch(JobPatch::default().results(results));

        assert_eq!(
            job.metadata.get("title"),
            Some(&Value::String("a".into()))
        );
        assert_eq!(
            job.results.get("report_path"),
            Some(&Value::String("r.md".into()))
        );
    }

    #[test]
    fn updated_at_is_monotonic_non_decreasing() {
        let mut job = Job::new(JobType::Cleanup, HashMap::new());
        let first = job.updated_at;
        job.apply_patch(JobPatch::default().error("boom"));
        assert!(job.updated_at >= first);
    }

    #[test]
    fn completed_requires_results_and_timestamp_by_contract() {
        // The invariant that `status = completed ⇒ results non-empty` is
        // a caller contract enforced by the coordinator, not the model;
        // verify the model at least carries both fields when set together.
        let mut job = Job::new(JobType::BatchCrawl, HashMap::new());
        let mut results = HashMap::new();
        results.insert("per_url".to_string(), Value::Array(vec![]));
        job.apply_patch(
            JobPatch::default()
                .status(JobStatus::Completed)
                .results(results)
                .completed_now(),
        );
        assert_eq!(job.status, JobStatus::Completed);
        assert!(!job.results.is_empty());
        assert!(job.completed_at.is_some());
    }
}
