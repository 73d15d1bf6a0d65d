//! Artifact Store (C4): content-addressed by a stable logical path
//! (e.g. `batch/<job_id>/report_0.md`), backed by cloud object storage
//! or a local directory tree.

mod cloud;
mod local_fs;

use std::sync::Arc;

use async_trait::async_trait;
use common::{Config, CoreError};
use tracing::{info, warn};

pub use cloud::CloudArtifactStore;
pub use local_fs::LocalFsArtifactStore;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn save(
        &self,
        logical_path: &str,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<(), CoreError>;

    async fn get(&self, logical_path: &str) -> Result<Option<Vec<u8>>, CoreError>;

    async fn delete(&self, logical_path: &str) -> Result<(), CoreError>;

    async fn exists(&self, logical_path: &str) -> Result<bool, CoreError>;
}

/// Select a backend for the process lifetime: cloud object storage when
/// the environment probe says so, otherwise a local directory tree rooted
/// at `config.artifact_root`. Unlike the Job Store and Task Queue, the
/// local filesystem backend has no connectivity to fail at startup, so
/// there is no in-memory fallback here.
pub fn build(probe: crate::env::EnvironmentProbe, config: &Config) -> Arc<dyn ArtifactStore> {
    if probe.is_cloud() {
        info!("artifact store: selecting cloud object storage backend");
        return Arc::new(CloudArtifactStore::new(config));
    }

    match LocalFsArtifactStore::new(&config.artifact_root) {
        Ok(store) => {
            info!(root = %config.artifact_root, "artifact store: selecting local filesystem backend");
            Arc::new(store)
        }
        Err(e) => {
            warn!(error = %e, "artifact store: failed to prepare local artifact root, proceeding anyway");
            Arc::new(LocalFsArtifactStore::new_unchecked(&config.artifact_root))
        }
    }
}
