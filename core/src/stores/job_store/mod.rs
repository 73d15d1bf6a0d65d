//! Job Store (C2): persists Job records, CRUD plus list/filter by status.

mod cloud;
mod local_kv;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use common::models::job::{Job, JobPatch, JobStatus, JobType};
use common::{Config, CoreError};
use tracing::{info, warn};

pub use cloud::CloudJobStore;
pub use local_kv::LocalKvJobStore;
pub use memory::InMemoryJobStore;

/// Optional filter applied by [`JobStore::list`].
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(
        &self,
        job_type: JobType,
        metadata: std::collections::HashMap<String, serde_json::Value>,
    ) -> Result<String, CoreError>;

    async fn get(&self, job_id: &str) -> Result<Option<Job>, CoreError>;

    async fn update(&self, job_id: &str, patch: JobPatch) -> Result<(), CoreError>;

    async fn list(&self, filter: JobFilter, limit: usize) -> Result<Vec<Job>, CoreError>;
}

/// Sort jobs by `created_at` descending, tie-breaking by `job_id` so that
/// `list` is deterministic across backends even when two jobs share a
/// timestamp.
pub(crate) fn sort_jobs_newest_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.job_id.cmp(&a.job_id))
    });
}

/// Select a backend for the process lifetime: cloud if the environment
/// probe says so, otherwise local KV, falling back to an in-memory map if
/// the local KV endpoint can't be reached at startup. Selection happens
/// exactly once; the returned store is shared behind an `Arc`.
pub async fn build(probe: crate::env::EnvironmentProbe, config: &Config) -> Arc<dyn JobStore> {
    if probe.is_cloud() {
        info!("job store: selecting cloud document store backend");
        return Arc::new(CloudJobStore::new(config));
    }

    match LocalKvJobStore::connect(config).await {
        Ok(store) => {
            info!(
                host = %config.local_kv_host,
                port = config.local_kv_port,
                "job store: selecting local KV backend"
            );
            Arc::new(store)
        }
        Err(e) => {
            warn!(
                error = %e,
                "job store: local KV endpoint unreachable, falling back to in-memory store"
            );
            Arc::new(InMemoryJobStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use common::models::job::Job;

    fn job_at(job_id: &str, created_at: chrono::DateTime<Utc>) -> Job {
        let mut job = Job::new(JobType::SingleCrawl, Default::default());
        job.job_id = job_id.to_string();
        job.created_at = created_at;
        job
    }

    #[test]
    fn sort_breaks_ties_by_job_id_descending() {
        let now = Utc::now();
        let mut jobs = vec![job_at("a", now), job_at("b", now)];
        sort_jobs_newest_first(&mut jobs);
        assert_eq!(jobs[0].job_id, "b");
        assert_eq!(jobs[1].job_id, "a");
    }

    #[test]
    fn sort_orders_by_created_at_descending() {
        let now = Utc::now();
        let mut jobs = vec![
            job_at("old", now - Duration::seconds(10)),
            job_at("new", now),
        ];
        sort_jobs_newest_first(&mut jobs);
        assert_eq!(jobs[0].job_id, "new");
    }
}
