//! Batch Coordinator (C7): fans a batch of URLs out across a bounded
//! worker pool, writes predictable per-URL artifacts, optionally collates
//! them, and fires the caller's webhook on completion.

pub mod collate;
pub mod paths;

use std::collections::HashMap;
use std::sync::Arc;

use common::models::batch::{BatchOptions, CollateOptions, PerUrlResult, UrlStatus};
use common::models::job::{Job, JobPatch, JobStatus, JobType};
use common::models::webhook::WebhookStats;
use common::CoreError;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::state::AppState;
use collate::CollatedEntry;

const DEFAULT_WORKER_POOL_CAP: usize = 5;

/// Outcome of running a batch to completion, independent of whether it
/// ran synchronously inline or as a dispatched task.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub per_url: Vec<PerUrlResult>,
    pub collated_url: Option<String>,
}

impl BatchOutcome {
    #[must_use]
    pub fn stats(&self) -> WebhookStats {
        WebhookStats::from_results(&self.per_url)
    }

    fn into_results_map(self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("per_url".to_string(), json!(self.per_url));
        if let Some(url) = self.collated_url {
            map.insert("collated_url".to_string(), json!(url));
        }
        map
    }
}

/// Serializable shape stored in `Job.metadata` for an async batch job so
/// the `batch-crawl` task handler can reconstruct the original request.
pub fn batch_metadata(options: &BatchOptions) -> HashMap<String, Value> {
    let mut metadata = HashMap::new();
    metadata.insert("urls".to_string(), json!(options.urls));
    metadata.insert("collate".to_string(), json!(options.collate));
    metadata.insert("collate_options".to_string(), json!(options.collate_options));
    metadata.insert("webhook".to_string(), json!(options.webhook));
    metadata.insert("crawl_options".to_string(), options.crawl_options.clone());
    metadata
}

/// Reconstruct the batch request from a job's metadata, the inverse of
/// [`batch_metadata`].
pub fn options_from_job(job: &Job) -> Result<BatchOptions, CoreError> {
    let urls: Vec<String> = job
        .metadata
        .get("urls")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e: serde_json::Error| CoreError::Validation(e.to_string()))?
        .ok_or_else(|| CoreError::Validation("job metadata missing urls".to_string()))?;

    let collate = job
        .metadata
        .get("collate")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let collate_options: Option<CollateOptions> = job
        .metadata
        .get("collate_options")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e: serde_json::Error| CoreError::Validation(e.to_string()))?
        .flatten();

    let webhook = job
        .metadata
        .get("webhook")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e: serde_json::Error| CoreError::Validation(e.to_string()))?
        .flatten();

    let crawl_options = job
        .metadata
        .get("crawl_options")
        .cloned()
        .unwrap_or_else(|| json!({}));

    Ok(BatchOptions {
        urls,
        run_async: true,
        collate,
        collate_options,
        webhook,
        crawl_options,
    })
}

/// Create a job and run the batch to completion inline, for `async=false`
/// submissions.
#[instrument(skip(state, options))]
pub async fn run_sync(state: &AppState, options: &BatchOptions) -> Result<(String, BatchOutcome), CoreError> {
    let job_id = state
        .job_store
        .create(JobType::BatchCrawl, batch_metadata(options))
        .await?;
    state
        .job_store
        .update(
            &job_id,
            JobPatch::default()
                .status(JobStatus::Processing)
                .processing_started_now(),
        )
        .await?;

    let outcome = execute_batch(state, &job_id, options).await?;
    finish_job(state, &job_id, outcome.clone(), options.webhook.as_ref()).await;
    Ok((job_id, outcome))
}

/// Create a pending job and enqueue the `batch-crawl` task, for
/// `async=true` submissions. Returns the job id, the predicted per-URL
/// results, and the predicted collated path if collation was requested —
/// all computed exactly as in synchronous mode so the caller sees the
/// same paths the completed job will eventually report.
#[instrument(skip(state, options))]
pub async fn run_async(
    state: &AppState,
    options: &BatchOptions,
) -> Result<(String, Vec<PerUrlResult>, Option<String>), CoreError> {
    let job_id = state
        .job_store
        .create(JobType::BatchCrawl, batch_metadata(options))
        .await?;
    state
        .task_queue
        .enqueue("batch-crawl", HashMap::new(), &job_id, 0)
        .await?;

    let collated_url = options.collate.then(|| paths::collated_path(&job_id));
    Ok((
        job_id.clone(),
        paths::predicted_results(&job_id, &options.urls),
        collated_url,
    ))
}

/// Run the crawl fan-out for an already-created job and persist its
/// outcome, firing the webhook if one is configured. Used by the
/// `batch-crawl` task handler for the async path.
pub async fn run_for_job(state: &AppState, job: &Job) -> Result<HashMap<String, Value>, CoreError> {
    let options = options_from_job(job)?;
    let outcome = execute_batch(state, &job.job_id, &options).await?;
    let webhook = options.webhook.clone();
    let results = outcome.clone().into_results_map();
    // The job itself is marked completed by the task-handler protocol right
    // after this returns; fire the webhook against the outcome we just
    // computed rather than re-reading the job back.
    crate::webhook::fire_if_configured(state, webhook.as_ref(), &job.job_id, "completed", &outcome).await;
    Ok(results)
}

async fn finish_job(
    state: &AppState,
    job_id: &str,
    outcome: BatchOutcome,
    webhook: Option<&common::models::batch::WebhookConfig>,
) {
    let results = outcome.clone().into_results_map();
    if let Err(e) = state
        .job_store
        .update(
            job_id,
            JobPatch::default()
                .status(JobStatus::Completed)
                .results(results)
                .completed_now(),
        )
        .await
    {
        warn!(job_id, error = %e, "failed to persist completed batch job");
    }
    crate::webhook::fire_if_configured(state, webhook, job_id, "completed", &outcome).await;
}

/// Crawl every URL concurrently with a worker pool of `min(n, 5)`, write
/// per-URL artifacts at their predicted paths, and collate if requested.
/// A per-URL failure never aborts its peers.
async fn execute_batch(state: &AppState, job_id: &str, options: &BatchOptions) -> Result<BatchOutcome, CoreError> {
    let pool_size = options.urls.len().min(DEFAULT_WORKER_POOL_CAP).max(1);
    let crawl_options: Arc<HashMap<String, Value>> = Arc::new(
        options
            .crawl_options
            .as_object()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect(),
    );

    let job_id_owned = job_id.to_string();
    let mut per_item: Vec<(usize, PerUrlResult, Option<String>)> = stream::iter(options.urls.iter().cloned().enumerate())
        .map(|(i, url)| {
            let state = state.clone();
            let job_id = job_id_owned.clone();
            let crawl_options = crawl_options.clone();
            async move { crawl_one(&state, &job_id, i, url, &crawl_options).await }
        })
        .buffer_unordered(pool_size)
        .collect()
        .await;

    per_item.sort_by_key(|(i, _, _)| *i);

    let collated_url = if options.collate {
        let collate_options = options.collate_options.clone().unwrap_or_default();
        let entries: Vec<CollatedEntry<'_>> = per_item
            .iter()
            .filter(|(_, result, _)| result.status == UrlStatus::Completed)
            .filter_map(|(_, result, markdown)| {
                markdown.as_deref().map(|md| CollatedEntry { url: &result.url, markdown: md })
            })
            .collect();
        let collated = collate::collate(&collate_options, &entries);
        let path = paths::collated_path(job_id);
        state
            .artifact_store
            .save(&path, collated.into_bytes(), "text/markdown")
            .await?;
        Some(path)
    } else {
        None
    };

    Ok(BatchOutcome {
        per_url: per_item.into_iter().map(|(_, result, _)| result).collect(),
        collated_url,
    })
}

async fn crawl_one(
    state: &AppState,
    job_id: &str,
    index: usize,
    url: String,
    crawl_options: &HashMap<String, Value>,
) -> (usize, PerUrlResult, Option<String>) {
    let report_path = paths::report_path(job_id, index);
    let data_path = paths::data_path(job_id, index);

    match state.crawler.crawl(&url, crawl_options).await {
        Ok(crawl_result) => {
            let data = json!({
                "url": url,
                "title": crawl_result.title,
            });
            let save_ok = state
                .artifact_store
                .save(&report_path, crawl_result.markdown.clone().into_bytes(), "text/markdown")
                .await
                .and(
                    state
                        .artifact_store
                        .save(&data_path, data.to_string().into_bytes(), "application/json")
                        .await,
                );

            match save_ok {
                Ok(()) => {
                    info!(job_id, index, url = %url, "crawled URL successfully");
                    (
                        index,
                        PerUrlResult {
                            url,
                            status: UrlStatus::Completed,
                            markdown_url: report_path,
                            json_url: data_path,
                            error: None,
                        },
                        Some(crawl_result.markdown),
                    )
                }
                Err(e) => failed_result(index, url, report_path, data_path, e.to_string()).await,
            }
        }
        Err(e) => {
            let error = e.to_string();
            warn!(job_id, index, url = %url, error = %error, "crawl failed");
            let stub = format!("# Crawl failed\n\nURL: {url}\n\nError: {error}\n");
            let _ = state.artifact_store.save(&report_path, stub.into_bytes(), "text/markdown").await;
            let _ = state
                .artifact_store
                .save(&data_path, json!({"url": url, "error": error}).to_string().into_bytes(), "application/json")
                .await;
            (
                index,
                PerUrlResult {
                    url,
                    status: UrlStatus::Failed,
                    markdown_url: report_path,
                    json_url: data_path,
                    error: Some(error),
                },
                None,
            )
        }
    }
}

async fn failed_result(
    index: usize,
    url: String,
    report_path: String,
    data_path: String,
    error: String,
) -> (usize, PerUrlResult, Option<String>) {
    (
        index,
        PerUrlResult {
            url,
            status: UrlStatus::Failed,
            markdown_url: report_path,
            json_url: data_path,
            error: Some(error),
        },
        None,
    )
}
