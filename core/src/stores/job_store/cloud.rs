//! Cloud Job Store: a document store reached over HTTP, keyed by
//! `job_id` in a configured collection. All operations are network I/O;
//! there is no local caching.
//!
//! The wire contract is a small REST document API
//! (`PUT/GET {endpoint}/{collection}/{job_id}`,
//! `GET {endpoint}/{collection}?status=&limit=`) so that any managed
//! document store fronted by such an API (the deployment target) can back
//! this trait without this crate depending on a vendor SDK.

use std::collections::HashMap;

use async_trait::async_trait;
use common::models::job::{Job, JobPatch, JobType};
use common::{Config, CoreError};
use reqwest::{Client, StatusCode};
use tracing::instrument;

use super::{sort_jobs_newest_first, JobFilter, JobStore};

pub struct CloudJobStore {
    client: Client,
    endpoint: String,
    collection: String,
}

impl CloudJobStore {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            endpoint: config
                .cloud_documents_endpoint
                .clone()
                .unwrap_or_default(),
            collection: config.cloud_documents_collection.clone(),
        }
    }

    fn doc_url(&self, job_id: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.collection, job_id)
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.collection)
    }
}

#[async_trait]
impl JobStore for CloudJobStore {
    #[instrument(skip(self, metadata))]
    async fn create(
        &self,
        job_type: JobType,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<String, CoreError> {
        let job = Job::new(job_type, metadata);
        let job_id = job.job_id.clone();

        let response = self
            .client
            .put(self.doc_url(&job_id))
            .json(&job)
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "document store returned {} creating job {job_id}",
                response.status()
            )));
        }

        Ok(job_id)
    }

    #[instrument(skip(self))]
    async fn get(&self, job_id: &str) -> Result<Option<Job>, CoreError> {
        let response = self
            .client
            .get(self.doc_url(job_id))
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let job = response
                    .json::<Job>()
                    .await
                    .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
                Ok(Some(job))
            }
            status => Err(CoreError::BackendUnavailable(format!(
                "document store returned {status} fetching job {job_id}"
            ))),
        }
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, job_id: &str, patch: JobPatch) -> Result<(), CoreError> {
        let mut job = self
            .get(job_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("job {job_id}")))?;
        job.apply_patch(patch);

        let response = self
            .client
            .put(self.doc_url(job_id))
            .json(&job)
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "document store returned {} updating job {job_id}",
                response.status()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: JobFilter, limit: usize) -> Result<Vec<Job>, CoreError> {
        let mut request = self
            .client
            .get(self.collection_url())
            .query(&[("limit", limit.to_string())]);
        if let Some(status) = filter.status {
            request = request.query(&[("status", status.to_string())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "document store returned {} listing jobs",
                response.status()
            )));
        }

        let mut jobs: Vec<Job> = response
            .json()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        sort_jobs_newest_first(&mut jobs);
        jobs.truncate(limit);
        Ok(jobs)
    }
}
