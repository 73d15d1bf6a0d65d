//! Common task-handler protocol: authenticate the caller, load the job,
//! transition it to `processing`, run the handler body, persist the
//! outcome, and always answer with a 2xx unless the payload itself was
//! invalid.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use common::models::job::{Job, JobPatch};
use common::models::response::ApiResponse;
use common::{Config, CoreError};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::state::AppState;

/// What a specific handler (`process-image`, `batch-crawl`,
/// `cleanup-old-jobs`) returns on success: the fields to merge into
/// `Job.results`.
pub type HandlerResponse = HashMap<String, Value>;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(m) => AppError::BadRequest(m),
            CoreError::NotFound(m) => AppError::NotFound(m),
            CoreError::Unauthorized(m) => AppError::Unauthorized(m),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            AppError::Unauthorized(m) => (StatusCode::FORBIDDEN, m),
        };
        (status, Json(ApiResponse::error(message))).into_response()
    }
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(
        &self,
        state: &AppState,
        job: &Job,
        payload: HashMap<String, Value>,
    ) -> Result<HandlerResponse, CoreError>;
}

/// Accept any caller in local mode (loopback is implicitly trusted); in
/// cloud mode require a bearer token to be present. Validating the token's
/// signature against the cloud identity provider is out of scope here —
/// only the presence check that the interface requires is implemented.
fn verify_caller(headers: &HeaderMap, config: &Config) -> Result<(), CoreError> {
    if !config.running_in_cloud {
        return Ok(());
    }
    match headers.get(axum::http::header::AUTHORIZATION) {
        Some(v) if v.to_str().map(|s| s.starts_with("Bearer ")).unwrap_or(false) => Ok(()),
        _ => Err(CoreError::Unauthorized(
            "missing or malformed bearer token".to_string(),
        )),
    }
}

#[instrument(skip(state, headers, payload, handler), fields(task_type))]
pub async fn dispatch(
    state: &AppState,
    task_type: &str,
    job_id: &str,
    headers: HeaderMap,
    payload: HashMap<String, Value>,
    handler: &dyn TaskHandler,
) -> axum::response::Response {
    if let Err(e) = verify_caller(&headers, &state.config) {
        warn!(task_type, job_id, "rejecting unauthenticated task dispatch");
        return AppError::from(e).into_response();
    }

    let job = match state.job_store.get(job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            return AppError::NotFound(format!("job {job_id} not found")).into_response();
        }
        Err(e) => {
            error!(job_id, error = %e, "job store unavailable while dispatching task");
            return (StatusCode::OK, Json(ApiResponse::error(e.to_string()))).into_response();
        }
    };

    if !job.status.is_terminal() {
        let started = JobPatch::default()
            .status(common::models::job::JobStatus::Processing)
            .processing_started_now();
        if let Err(e) = state.job_store.update(job_id, started).await {
            warn!(job_id, error = %e, "failed to record processing_started_at");
        }
    }

    match handler.handle(state, &job, payload).await {
        Ok(results) => {
            info!(job_id, task_type, "task handler completed successfully");
            let patch = JobPatch::default()
                .status(common::models::job::JobStatus::Completed)
                .results(results.clone())
                .completed_now();
            if let Err(e) = state.job_store.update(job_id, patch).await {
                error!(job_id, error = %e, "failed to persist completed job state");
            }
            (StatusCode::OK, Json(ApiResponse::ok().with("results", Value::Object(results.into_iter().collect())))).into_response()
        }
        Err(CoreError::Validation(msg)) => {
            warn!(job_id, task_type, error = %msg, "task handler rejected payload");
            let patch = JobPatch::default()
                .status(common::models::job::JobStatus::Failed)
                .error(msg.clone())
                .failed_now();
            if let Err(e) = state.job_store.update(job_id, patch).await {
                error!(job_id, error = %e, "failed to persist failed job state");
            }
            (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg))).into_response()
        }
        Err(e) => {
            error!(job_id, task_type, error = %e, "task handler failed");
            let patch = JobPatch::default()
                .status(common::models::job::JobStatus::Failed)
                .error(e.to_string())
                .failed_now();
            if let Err(update_err) = state.job_store.update(job_id, patch).await {
                error!(job_id, error = %update_err, "failed to persist failed job state");
            }
            (StatusCode::OK, Json(ApiResponse::error(e.to_string()))).into_response()
        }
    }
}
