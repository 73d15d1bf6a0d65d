//! Local filesystem Artifact Store: logical paths map directly onto a
//! directory tree rooted at `artifact_root`, e.g. `batch/<job_id>/report_0.md`
//! becomes `<root>/batch/<job_id>/report_0.md`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use common::CoreError;
use tokio::fs;

use super::ArtifactStore;

pub struct LocalFsArtifactStore {
    root: PathBuf,
}

impl LocalFsArtifactStore {
    pub fn new(root: &str) -> Result<Self, CoreError> {
        std::fs::create_dir_all(root).map_err(CoreError::from)?;
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    /// Build a store without verifying the root exists yet; used as a
    /// last-resort fallback so startup never blocks on filesystem setup.
    #[must_use]
    pub fn new_unchecked(root: &str) -> Self {
        Self {
            root: PathBuf::from(root),
        }
    }

    fn resolve(&self, logical_path: &str) -> Result<PathBuf, CoreError> {
        if Path::new(logical_path)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(CoreError::Validation(format!(
                "artifact path must not contain '..': {logical_path}"
            )));
        }
        Ok(self.root.join(logical_path))
    }
}

#[async_trait]
impl ArtifactStore for LocalFsArtifactStore {
    async fn save(
        &self,
        logical_path: &str,
        content: Vec<u8>,
        _mime_type: &str,
    ) -> Result<(), CoreError> {
        let path = self.resolve(logical_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
        Ok(())
    }

    async fn get(&self, logical_path: &str) -> Result<Option<Vec<u8>>, CoreError> {
        let path = self.resolve(logical_path)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::from(e)),
        }
    }

    async fn delete(&self, logical_path: &str) -> Result<(), CoreError> {
        let path = self.resolve(logical_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::from(e)),
        }
    }

    async fn exists(&self, logical_path: &str) -> Result<bool, CoreError> {
        let path = self.resolve(logical_path)?;
        Ok(fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path().to_str().unwrap()).unwrap();
        store
            .save("batch/j1/report_0.md", b"# hello".to_vec(), "text/markdown")
            .await
            .unwrap();
        let content = store.get("batch/j1/report_0.md").await.unwrap().unwrap();
        assert_eq!(content, b"# hello");
    }

    #[tokio::test]
    async fn missing_artifact_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path().to_str().unwrap()).unwrap();
        assert!(store.get("batch/j1/missing.md").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path().to_str().unwrap()).unwrap();
        store.delete("batch/j1/never_existed.md").await.unwrap();
    }

    #[tokio::test]
    async fn exists_reflects_save_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path().to_str().unwrap()).unwrap();
        store
            .save("batch/j1/data_0.json", b"{}".to_vec(), "application/json")
            .await
            .unwrap();
        assert!(store.exists("batch/j1/data_0.json").await.unwrap());
        store.delete("batch/j1/data_0.json").await.unwrap();
        assert!(!store.exists("batch/j1/data_0.json").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_parent_dir_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsArtifactStore::new(dir.path().to_str().unwrap()).unwrap();
        let err = store.get("../outside.md").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
