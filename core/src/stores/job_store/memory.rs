//! In-memory Job Store: the fallback backend used when the local KV
//! endpoint is unreachable at startup. Guards its map with a mutex since
//! this is the one backend that isn't naturally concurrent.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use common::models::job::{Job, JobPatch, JobStatus, JobType};
use common::CoreError;
use tracing::info;

use super::{sort_jobs_newest_first, JobFilter, JobStore};

pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(
        &self,
        job_type: JobType,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<String, CoreError> {
        let job = Job::new(job_type, metadata);
        let job_id = job.job_id.clone();
        self.jobs
            .lock()
            .map_err(|_| CoreError::BackendUnavailable("in-memory job store poisoned".into()))?
            .insert(job_id.clone(), job);
        info!(job_id = %job_id, "created job in memory");
        Ok(job_id)
    }

    async fn get(&self, job_id: &str) -> Result<Option<Job>, CoreError> {
        let jobs = self
            .jobs
            .lock()
            .map_err(|_| CoreError::BackendUnavailable("in-memory job store poisoned".into()))?;
        Ok(jobs.get(job_id).cloned())
    }

    async fn update(&self, job_id: &str, patch: JobPatch) -> Result<(), CoreError> {
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| CoreError::BackendUnavailable("in-memory job store poisoned".into()))?;
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| CoreError::NotFound(format!("job {job_id}")))?;
        job.apply_patch(patch);
        Ok(())
    }

    async fn list(&self, filter: JobFilter, limit: usize) -> Result<Vec<Job>, CoreError> {
        let jobs = self
            .jobs
            .lock()
            .map_err(|_| CoreError::BackendUnavailable("in-memory job store poisoned".into()))?;
        let mut matched: Vec<Job> = jobs
            .values()
            .filter(|j| filter.status.map(|s| s == j.status).unwrap_or(true))
            .cloned()
            .collect();
        sort_jobs_newest_first(&mut matched);
        matched.truncate(limit);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = InMemoryJobStore::new();
        let job_id = store
            .create(JobType::BatchCrawl, HashMap::new())
            .await
            .unwrap();
        let job = store.get(&job_id).await.unwrap().unwrap();
        assert_eq!(job.job_type, JobType::BatchCrawl);
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn get_missing_job_returns_none() {
        let store = InMemoryJobStore::new();
        assert!(store.get("does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_job_is_not_found() {
        let store = InMemoryJobStore::new();
        let err = store
            .update("missing", JobPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_by_status_and_respects_limit() {
        let store = InMemoryJobStore::new();
        for _ in 0..3 {
            store
                .create(JobType::SingleCrawl, HashMap::new())
                .await
                .unwrap();
        }
        let completed_id = store
            .create(JobType::SingleCrawl, HashMap::new())
            .await
            .unwrap();
        store
            .update(
                &completed_id,
                JobPatch::default()
                    .status(JobStatus::Completed)
                    .completed_now(),
            )
            .await
            .unwrap();

        let pending = store
            .list(
                JobFilter {
                    status: Some(JobStatus::Pending),
                },
                10,
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 3);

        let limited = store.list(JobFilter::default(), 2).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn terminal_status_update_is_sticky() {
        let store = InMemoryJobStore::new();
        let job_id = store
            .create(JobType::SingleCrawl, HashMap::new())
            .await
            .unwrap();
        store
            .update(&job_id, JobPatch::default().status(JobStatus::Failed).failed_now())
            .await
            .unwrap();
        store
            .update(&job_id, JobPatch::default().status(JobStatus::Processing))
            .await
            .unwrap();
        let job = store.get(&job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
    }
}
