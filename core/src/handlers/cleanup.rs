//! `cleanup-old-jobs` task handler: deletes artifacts for jobs older than
//! a retention window and marks them `cleaned_up`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::models::job::{Job, JobPatch, JobStatus};
use common::CoreError;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::handlers::common::{HandlerResponse, TaskHandler};
use crate::state::AppState;
use crate::stores::job_store::JobFilter;

const DEFAULT_DAYS_TO_KEEP: i64 = 30;
const CLEANUP_LIST_LIMIT: usize = 10_000;

pub struct CleanupHandler;

#[async_trait]
impl TaskHandler for CleanupHandler {
    async fn handle(
        &self,
        state: &AppState,
        _job: &Job,
        payload: HashMap<String, Value>,
    ) -> Result<HandlerResponse, CoreError> {
        let days_to_keep = payload
            .get("days_to_keep")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_DAYS_TO_KEEP);
        let cutoff = Utc::now() - Duration::days(days_to_keep);

        let candidates = state
            .job_store
            .list(JobFilter::default(), CLEANUP_LIST_LIMIT)
            .await?
            .into_iter()
            .filter(|job| job.created_at < cutoff)
            .filter(|job| !matches!(job.status, JobStatus::CleanedUp | JobStatus::Deleted));

        let mut jobs_deleted = 0u64;
        let mut jobs_failed = 0u64;

        for job in candidates {
            match clean_one(state, &job).await {
                Ok(files_deleted) => {
                    info!(job_id = %job.job_id, files = files_deleted.len(), "cleaned up job artifacts");
                    jobs_deleted += 1;
                }
                Err(e) => {
                    warn!(job_id = %job.job_id, error = %e, "failed to clean up job");
                    jobs_failed += 1;
                }
            }
        }

        let mut results = HashMap::new();
        results.insert("jobs_deleted".to_string(), json!(jobs_deleted));
        results.insert("jobs_failed".to_string(), json!(jobs_failed));
        results.insert("days_to_keep".to_string(), json!(days_to_keep));
        Ok(results)
    }
}

async fn clean_one(state: &AppState, job: &Job) -> Result<Vec<String>, CoreError> {
    let mut files_deleted = Vec::new();
    for path in artifact_paths(&job.results) {
        state.artifact_store.delete(&path).await?;
        files_deleted.push(path);
    }

    state
        .job_store
        .update(
            &job.job_id,
            JobPatch::default()
                .status(JobStatus::CleanedUp)
                .results(HashMap::from([(
                    "files_deleted".to_string(),
                    json!(files_deleted),
                )]))
                .cleaned_up_now(),
        )
        .await?;

    Ok(files_deleted)
}

/// Every `*_path`/`*_url` string value recorded anywhere in a job's
/// results, including inside nested arrays such as `per_url`. Generalizes
/// the fixed three-category deletion list of the original implementation
/// to the variable number of per-URL artifacts a batch job can produce.
fn artifact_paths(results: &HashMap<String, Value>) -> Vec<String> {
    let mut paths = Vec::new();
    for (key, value) in results {
        collect_paths(key, value, &mut paths);
    }
    paths
}

fn collect_paths(key: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if key.ends_with("_path") || key.ends_with("_url") => out.push(s.clone()),
        Value::Array(items) => {
            for item in items {
                if let Value::Object(map) = item {
                    for (k, v) in map {
                        collect_paths(k, v, out);
                    }
                }
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                collect_paths(k, v, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_top_level_and_nested_paths() {
        let mut results = HashMap::new();
        results.insert("report_path".to_string(), json!("reports/j1/report.md"));
        results.insert(
            "per_url".to_string(),
            json!([
                {"markdown_url": "batch/j1/report_0.md", "json_url": "batch/j1/data_0.json"},
                {"markdown_url": "batch/j1/report_1.md", "json_url": "batch/j1/data_1.json"},
            ]),
        );
        results.insert("collated_url".to_string(), json!("batch/j1/collated.md"));

        let mut paths = artifact_paths(&results);
        paths.sort();

        assert_eq!(
            paths,
            vec![
                "batch/j1/collated.md",
                "batch/j1/data_0.json",
                "batch/j1/data_1.json",
                "batch/j1/report_0.md",
                "batch/j1/report_1.md",
                "reports/j1/report.md",
            ]
        );
    }
}
