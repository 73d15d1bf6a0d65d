//! `process-image` handler: OCRs an uploaded image into Markdown and HTML
//! reports.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use common::models::job::Job;
use common::CoreError;
use serde_json::{json, Value};

use crate::handlers::common::{HandlerResponse, TaskHandler};
use crate::state::AppState;

pub struct ProcessImageHandler;

#[async_trait]
impl TaskHandler for ProcessImageHandler {
    async fn handle(
        &self,
        state: &AppState,
        job: &Job,
        _payload: HashMap<String, Value>,
    ) -> Result<HandlerResponse, CoreError> {
        let file_path = job
            .metadata
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Validation("metadata.file_path is required".to_string()))?;

        let image_bytes = state
            .artifact_store
            .get(file_path)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("artifact {file_path}")))?;

        let title = job.metadata.get("title").and_then(Value::as_str);

        let started = Instant::now();
        let ocr_result = state
            .ocr
            .process(&image_bytes, title)
            .await
            .map_err(|e| CoreError::HandlerInternal(e.to_string()))?;
        let processing_time = started.elapsed().as_secs_f64();

        let report_path = format!("reports/{}/report.md", job.job_id);
        let html_path = format!("reports/{}/report.html", job.job_id);

        state
            .artifact_store
            .save(&report_path, ocr_result.markdown.into_bytes(), "text/markdown")
            .await?;
        state
            .artifact_store
            .save(&html_path, ocr_result.html.into_bytes(), "text/html")
            .await?;

        let mut results = HashMap::new();
        results.insert("report_path".to_string(), json!(report_path));
        results.insert("html_path".to_string(), json!(html_path));
        results.insert("processing_time".to_string(), json!(processing_time));
        Ok(results)
    }
}
