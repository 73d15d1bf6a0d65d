//! Cloud Task Queue: hands tasks to a managed scheduled-push queue over
//! HTTP at enqueue time. The queue provider does its own scheduling and
//! delivery, so the local-dispatch operations below never run in cloud
//! mode; the dispatcher (C5) is local-mode only.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::models::task::Task;
use common::{Config, CoreError};
use reqwest::Client;
use tracing::instrument;

use super::TaskQueue;

pub struct CloudTaskQueue {
    client: Client,
    endpoint: String,
}

impl CloudTaskQueue {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.cloud_tasks_endpoint.clone().unwrap_or_default(),
        }
    }

    fn unsupported(op: &str) -> CoreError {
        CoreError::BackendUnavailable(format!(
            "{op} is a local-dispatch operation and is not supported by the cloud task queue"
        ))
    }
}

#[async_trait]
impl TaskQueue for CloudTaskQueue {
    #[instrument(skip(self, payload))]
    async fn enqueue(
        &self,
        task_type: &str,
        payload: HashMap<String, serde_json::Value>,
        job_id: &str,
        delay_seconds: i64,
    ) -> Result<String, CoreError> {
        let task = Task::new(task_type.to_string(), job_id.to_string(), payload, delay_seconds);
        let task_id = task.task_id.clone();

        let response = self
            .client
            .post(format!("{}/tasks", self.endpoint))
            .json(&task)
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::BackendUnavailable(format!(
                "managed queue returned {} scheduling task {task_id}",
                response.status()
            )));
        }
        Ok(task_id)
    }

    async fn dequeue_ready(&self, _task_type: &str, _max: usize) -> Result<Vec<Task>, CoreError> {
        Err(Self::unsupported("dequeue_ready"))
    }

    async fn remove(&self, _task_type: &str, _task_id: &str) -> Result<(), CoreError> {
        Err(Self::unsupported("remove"))
    }

    async fn reschedule(
        &self,
        _task_type: &str,
        _task_id: &str,
        _new_execute_at: DateTime<Utc>,
        _new_retry_count: u32,
    ) -> Result<(), CoreError> {
        Err(Self::unsupported("reschedule"))
    }

    async fn known_task_types(&self) -> Result<Vec<String>, CoreError> {
        Err(Self::unsupported("known_task_types"))
    }
}
