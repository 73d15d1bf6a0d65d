//! Cloud Artifact Store: an object storage bucket reached over HTTP,
//! keyed by logical path. Same REST-over-HTTP approach as the cloud Job
//! Store, so this crate never depends on a vendor object storage SDK.

use async_trait::async_trait;
use common::{Config, CoreError};
use reqwest::{Client, StatusCode};
use tracing::instrument;

use super::ArtifactStore;

pub struct CloudArtifactStore {
    client: Client,
    endpoint: String,
    bucket: String,
}

impl CloudArtifactStore {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.cloud_artifacts_endpoint.clone().unwrap_or_default(),
            bucket: config.cloud_bucket.clone().unwrap_or_default(),
        }
    }

    fn object_url(&self, logical_path: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, logical_path)
    }
}

#[async_trait]
impl ArtifactStore for CloudArtifactStore {
    #[instrument(skip(self, content))]
    async fn save(
        &self,
        logical_path: &str,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<(), CoreError> {
        let response = self
            .client
            .put(self.object_url(logical_path))
            .header("content-type", mime_type)
            .body(content)
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "object storage returned {} saving {logical_path}",
                response.status()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, logical_path: &str) -> Result<Option<Vec<u8>>, CoreError> {
        let response = self
            .client
            .get(self.object_url(logical_path))
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
                Ok(Some(bytes.to_vec()))
            }
            status => Err(CoreError::BackendUnavailable(format!(
                "object storage returned {status} fetching {logical_path}"
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, logical_path: &str) -> Result<(), CoreError> {
        let response = self
            .client
            .delete(self.object_url(logical_path))
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(CoreError::BackendUnavailable(format!(
                "object storage returned {} deleting {logical_path}",
                response.status()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn exists(&self, logical_path: &str) -> Result<bool, CoreError> {
        let response = self
            .client
            .head(self.object_url(logical_path))
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        Ok(response.status().is_success())
    }
}
