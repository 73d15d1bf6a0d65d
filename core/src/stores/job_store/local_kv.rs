//! Redis-backed Job Store for local development. Jobs are serialized as
//! JSON strings under `job:<job_id>`; `list` scans `job:*` and filters
//! client-side, matching the `KEYS job:*` approach the original service
//! used (acceptable at local-development scale; the cloud backend is
//! expected to carry production listing load).

use std::collections::HashMap;

use async_trait::async_trait;
use common::models::job::{Job, JobPatch, JobType};
use common::{Config, CoreError};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{sort_jobs_newest_first, JobFilter, JobStore};

const KEY_PREFIX: &str = "job:";

pub struct LocalKvJobStore {
    conn: ConnectionManager,
}

impl LocalKvJobStore {
    /// Connect to the configured local KV endpoint. Returns an error if
    /// the endpoint can't be reached — callers fall back to the in-memory
    /// backend in that case, at startup only.
    pub async fn connect(config: &Config) -> Result<Self, CoreError> {
        let url = format!("redis://{}:{}", config.local_kv_host, config.local_kv_port);
        let client = redis::Client::open(url)
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        Ok(Self { conn })
    }

    fn key(job_id: &str) -> String {
        format!("{KEY_PREFIX}{job_id}")
    }
}

#[async_trait]
impl JobStore for LocalKvJobStore {
    async fn create(
        &self,
        job_type: JobType,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<String, CoreError> {
        let job = Job::new(job_type, metadata);
        let job_id = job.job_id.clone();
        let serialized = serde_json::to_string(&job)?;

        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(Self::key(&job_id), serialized)
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        Ok(job_id)
    }

    async fn get(&self, job_id: &str) -> Result<Option<Job>, CoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(Self::key(job_id))
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        raw.map(|s| serde_json::from_str(&s).map_err(CoreError::from))
            .transpose()
    }

    async fn update(&self, job_id: &str, patch: JobPatch) -> Result<(), CoreError> {
        let mut job = self
            .get(job_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("job {job_id}")))?;
        job.apply_patch(patch);
        let serialized = serde_json::to_string(&job)?;

        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(Self::key(job_id), serialized)
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn list(&self, filter: JobFilter, limit: usize) -> Result<Vec<Job>, CoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn
            .keys(format!("{KEY_PREFIX}*"))
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        let mut jobs = Vec::with_capacity(keys.len());
        for key in keys {
            let raw: Option<String> = conn
                .get(&key)
                .await
                .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
            if let Some(raw) = raw {
                let job: Job = serde_json::from_str(&raw)?;
                if filter.status.map(|s| s == job.status).unwrap_or(true) {
                    jobs.push(job);
                }
            }
        }

        sort_jobs_newest_first(&mut jobs);
        jobs.truncate(limit);
        Ok(jobs)
    }
}
