//! OCR is an external collaborator invoked by the `process-image` handler.
//! Only the interface is in scope; the engine itself is out-of-scope per
//! Non-goals.

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct OcrResult {
    pub markdown: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine failed: {0}")]
    EngineFailure(String),
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn process(&self, image_bytes: &[u8], title: Option<&str>) -> Result<OcrResult, OcrError>;
}

/// Stub engine used when no real OCR backend is wired in.
pub struct UnconfiguredOcrEngine;

#[async_trait]
impl OcrEngine for UnconfiguredOcrEngine {
    async fn process(&self, _image_bytes: &[u8], _title: Option<&str>) -> Result<OcrResult, OcrError> {
        Err(OcrError::EngineFailure("no OCR engine configured".to_string()))
    }
}
