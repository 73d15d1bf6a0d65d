//! Task Dispatcher (C5, local mode only): a single long-running loop that
//! moves ready tasks from the Task Queue to their handler endpoint over
//! loopback HTTP. The cloud queue replaces this entirely in cloud mode.

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::state::AppState;

const DEQUEUE_BATCH_SIZE: usize = 5;
const IDLE_SLEEP: Duration = Duration::from_secs(1);
const ERROR_SLEEP: Duration = Duration::from_secs(5);

/// Start the dispatcher loop if it isn't already running in this process.
/// Subsequent calls are no-ops; only the first caller actually spawns it.
pub fn spawn(state: AppState, shutdown: CancellationToken) {
    if state
        .dispatcher_started
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        warn!("dispatcher already running in this process, ignoring duplicate start");
        return;
    }

    tokio::spawn(run(state, shutdown));
}

async fn run(state: AppState, shutdown: CancellationToken) {
    info!("task dispatcher started");
    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let sleep_for = match run_iteration(&state).await {
            Ok(true) => IDLE_SLEEP,
            Ok(false) => Duration::ZERO,
            Err(e) => {
                error!(error = %e, "dispatcher iteration failed");
                ERROR_SLEEP
            }
        };

        if sleep_for.is_zero() {
            continue;
        }

        tokio::select! {
            () = shutdown.cancelled() => break,
            () = tokio::time::sleep(sleep_for) => {}
        }
    }
    info!("task dispatcher shut down");
}

/// Runs one pass over every known task type. Returns `Ok(true)` if the
/// process was idle (nothing dequeued), `Ok(false)` if at least one task
/// was dispatched (so the next iteration should start immediately rather
/// than wait out the idle sleep).
async fn run_iteration(state: &AppState) -> anyhow::Result<bool> {
    let task_types = state.task_queue.known_task_types().await?;
    let mut dispatched_any = false;

    for task_type in task_types {
        let ready = state
            .task_queue
            .dequeue_ready(&task_type, DEQUEUE_BATCH_SIZE)
            .await?;

        for task in ready {
            dispatched_any = true;
            dispatch_one(state, &task_type, task).await;
        }
    }

    Ok(!dispatched_any)
}

async fn dispatch_one(state: &AppState, task_type: &str, task: common::models::task::Task) {
    let url = format!(
        "http://localhost:{}/tasks/{}/{}",
        state.config.http_port, task_type, task.job_id
    );

    let result = state
        .http_client
        .post(&url)
        .json(&task.payload)
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            if let Err(e) = state.task_queue.remove(task_type, &task.task_id).await {
                error!(task_id = %task.task_id, error = %e, "failed to remove delivered task from queue");
            }
        }
        Ok(response) => {
            warn!(
                task_id = %task.task_id,
                task_type,
                status = %response.status(),
                "handler returned non-2xx, will retry or fail task"
            );
            retry_or_fail(state, task_type, task).await;
        }
        Err(e) => {
            warn!(task_id = %task.task_id, task_type, error = %e, "handler dispatch failed, will retry or fail task");
            retry_or_fail(state, task_type, task).await;
        }
    }
}

async fn retry_or_fail(state: &AppState, task_type: &str, task: common::models::task::Task) {
    if task.retries_exhausted(state.config.max_retries) {
        error!(task_id = %task.task_id, task_type, "task exhausted retries, removing from queue");
        if let Err(e) = state.task_queue.remove(task_type, &task.task_id).await {
            error!(task_id = %task.task_id, error = %e, "failed to remove exhausted task");
        }
        return;
    }

    let next_retry_count = task.retry_count + 1;
    let new_execute_at = common::models::task::Task::next_attempt_execute_at(next_retry_count);
    if let Err(e) = state
        .task_queue
        .reschedule(task_type, &task.task_id, new_execute_at, next_retry_count)
        .await
    {
        error!(task_id = %task.task_id, error = %e, "failed to reschedule task");
    }
}
