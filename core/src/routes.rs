//! HTTP Façade (C9): request parsing, authentication is delegated to the
//! task-handler endpoints; this module owns routing and response shaping
//! only — no scheduling, retry, or persistence logic lives here.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use common::models::batch::{BatchOptions, CollateOptions, WebhookConfig};
use common::models::job::JobType;
use common::models::response::{ApiResponse, BatchAsyncResponse, BatchSyncResponse, JobStatusResponse, SingleCrawlResponse};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, instrument, warn};

use crate::coordinator;
use crate::handlers::{self, batch_crawl::BatchCrawlHandler, cleanup::CleanupHandler, process_image::ProcessImageHandler};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/upload-async", post(upload_async))
        .route("/api/markdown", post(markdown))
        .route("/api/jobs/:job_id", get(job_status))
        .route("/tasks/:task_type/:job_id", post(task_dispatch))
        .with_state(state)
}

#[instrument(skip(state, multipart))]
async fn upload_async(State(state): State<AppState>, mut multipart: Multipart) -> axum::response::Response {
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut filename = "upload".to_string();
    let mut title: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string()))).into_response();
            }
        };

        match field.name().map(str::to_string) {
            Some(name) if name == "image" => {
                filename = field.file_name().map(str::to_string).unwrap_or(filename);
                match field.bytes().await {
                    Ok(bytes) => image_bytes = Some(bytes.to_vec()),
                    Err(e) => {
                        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string()))).into_response();
                    }
                }
            }
            Some(name) if name == "title" => {
                title = field.text().await.ok();
            }
            _ => {}
        }
    }

    let Some(image_bytes) = image_bytes else {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error("missing required 'image' field"))).into_response();
    };

    let mut metadata = HashMap::new();
    if let Some(title) = &title {
        metadata.insert("title".to_string(), Value::String(title.clone()));
    }

    let job_id = match state.job_store.create(JobType::ImageProcessing, metadata).await {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "failed to create image-processing job");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(e.to_string()))).into_response();
        }
    };

    let file_path = format!("uploads/{job_id}/{filename}");
    if let Err(e) = state.artifact_store.save(&file_path, image_bytes, "application/octet-stream").await {
        error!(job_id, error = %e, "failed to store uploaded image");
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(e.to_string()))).into_response();
    }

    let mut metadata_patch = HashMap::new();
    metadata_patch.insert("file_path".to_string(), Value::String(file_path));
    if let Err(e) = state
        .job_store
        .update(&job_id, common::models::job::JobPatch::default().metadata(metadata_patch))
        .await
    {
        error!(job_id, error = %e, "failed to record uploaded file path on job");
    }

    if let Err(e) = state.task_queue.enqueue("process-image", HashMap::new(), &job_id, 0).await {
        error!(job_id, error = %e, "failed to enqueue process-image task");
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(e.to_string()))).into_response();
    }

    (
        StatusCode::OK,
        Json(ApiResponse::ok().with("job_id", job_id).with("status", "pending")),
    )
        .into_response()
}

/// Wire shape accepted by `/api/markdown`: either the legacy single-URL
/// body (`url` set) or the batch shape (`urls` set). Both shapes parse
/// into the same struct; which branch runs is decided on field presence.
#[derive(Debug, Deserialize)]
struct MarkdownRequest {
    url: Option<String>,
    urls: Option<Vec<String>>,
    #[serde(default = "default_true")]
    #[serde(rename = "async")]
    run_async: bool,
    #[serde(default)]
    collate: bool,
    collate_options: Option<CollateOptions>,
    webhook: Option<WebhookConfig>,
    #[serde(flatten)]
    crawl_options: HashMap<String, Value>,
}

fn default_true() -> bool {
    true
}

#[instrument(skip(state, body))]
async fn markdown(State(state): State<AppState>, Json(body): Json<MarkdownRequest>) -> axum::response::Response {
    if let Some(url) = body.url {
        return single_crawl(&state, url, body.crawl_options).await;
    }

    let Some(urls) = body.urls else {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error("either 'url' or 'urls' is required"))).into_response();
    };

    let options = BatchOptions {
        urls,
        run_async: body.run_async,
        collate: body.collate,
        collate_options: body.collate_options,
        webhook: body.webhook,
        crawl_options: serde_json::to_value(&body.crawl_options).unwrap_or_default(),
    };

    if let Err(msg) = options.validate() {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg))).into_response();
    }

    if options.run_async {
        match coordinator::run_async(&state, &options).await {
            Ok((job_id, results, collated_url)) => {
                let response = BatchAsyncResponse {
                    success: true,
                    mode: "batch_async",
                    status_url: format!("/api/jobs/{job_id}"),
                    job_id,
                    results,
                    collated_url,
                };
                (StatusCode::ACCEPTED, Json(response)).into_response()
            }
            Err(e) => {
                error!(error = %e, "failed to start async batch");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(e.to_string()))).into_response()
            }
        }
    } else {
        match coordinator::run_sync(&state, &options).await {
            Ok((_job_id, outcome)) => {
                let response = BatchSyncResponse {
                    success: true,
                    mode: "batch_sync",
                    results: outcome.per_url,
                    collated_url: outcome.collated_url,
                };
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(e) => {
                error!(error = %e, "failed to run sync batch");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(e.to_string()))).into_response()
            }
        }
    }
}

async fn single_crawl(state: &AppState, url: String, crawl_options: HashMap<String, Value>) -> axum::response::Response {
    match state.crawler.crawl(&url, &crawl_options).await {
        Ok(result) => (
            StatusCode::OK,
            Json(SingleCrawlResponse { success: true, url, markdown: result.markdown }),
        )
            .into_response(),
        Err(e) => {
            warn!(url = %url, error = %e, "legacy single-url crawl failed");
            (StatusCode::OK, Json(ApiResponse::error(e.to_string()))).into_response()
        }
    }
}

#[instrument(skip(state))]
async fn job_status(State(state): State<AppState>, Path(job_id): Path<String>) -> axum::response::Response {
    match state.job_store.get(&job_id).await {
        Ok(Some(job)) => {
            let response = JobStatusResponse {
                job_id: job.job_id,
                status: job.status.to_string(),
                job_type: job.job_type.to_string(),
                created_at: job.created_at,
                updated_at: job.updated_at,
                results: if job.results.is_empty() { None } else { Some(job.results) },
                error: job.error,
                failed_at: job.failed_at,
                processing_started_at: job.processing_started_at,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Job {job_id} not found"))),
        )
            .into_response(),
        Err(e) => {
            error!(job_id, error = %e, "job store unavailable while fetching job status");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(e.to_string()))).into_response()
        }
    }
}

#[instrument(skip(state, headers, payload))]
async fn task_dispatch(
    State(state): State<AppState>,
    Path((task_type, job_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(payload): Json<HashMap<String, Value>>,
) -> axum::response::Response {
    match task_type.as_str() {
        "process-image" => handlers::dispatch(&state, &task_type, &job_id, headers, payload, &ProcessImageHandler).await,
        "batch-crawl" => handlers::dispatch(&state, &task_type, &job_id, headers, payload, &BatchCrawlHandler).await,
        "cleanup-old-jobs" => handlers::dispatch(&state, &task_type, &job_id, headers, payload, &CleanupHandler).await,
        other => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("unknown task type '{other}'"))),
        )
            .into_response(),
    }
}
