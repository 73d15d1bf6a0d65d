//! Task Queue (C3): schedules individual work packets to execute at
//! specified times, with retries and local dispatch.

mod cloud;
mod local_kv;
mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::models::task::Task;
use common::{Config, CoreError};
use tracing::{info, warn};

pub use cloud::CloudTaskQueue;
pub use local_kv::LocalKvTaskQueue;
pub use memory::InMemoryTaskQueue;

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Schedule a task of `task_type` to run at `now + delay_seconds`.
    async fn enqueue(
        &self,
        task_type: &str,
        payload: HashMap<String, serde_json::Value>,
        job_id: &str,
        delay_seconds: i64,
    ) -> Result<String, CoreError>;

    /// Local-mode only: up to `max` tasks of `task_type` whose
    /// `execute_at <= now`, ordered by `execute_at` ascending. The cloud
    /// backend delivers tasks itself and never has anything to dequeue.
    async fn dequeue_ready(&self, task_type: &str, max: usize) -> Result<Vec<Task>, CoreError>;

    /// Local-mode only: remove a task from the ready set after a
    /// successful delivery.
    async fn remove(&self, task_type: &str, task_id: &str) -> Result<(), CoreError>;

    /// Local-mode only: re-add a task with a new `execute_at` and
    /// `retry_count` after a failed delivery attempt. The caller (the
    /// dispatcher) owns the backoff calculation; the store just persists it.
    async fn reschedule(
        &self,
        task_type: &str,
        task_id: &str,
        new_execute_at: DateTime<Utc>,
        new_retry_count: u32,
    ) -> Result<(), CoreError>;

    /// Local-mode only: the set of task types currently known to the
    /// queue, so the dispatcher can poll each of them in turn.
    async fn known_task_types(&self) -> Result<Vec<String>, CoreError>;
}

/// Select a backend for the process lifetime, mirroring the Job Store's
/// selection policy: cloud if the environment probe says so, otherwise
/// local KV, falling back to in-memory if unreachable at startup.
pub async fn build(probe: crate::env::EnvironmentProbe, config: &Config) -> Arc<dyn TaskQueue> {
    if probe.is_cloud() {
        info!("task queue: selecting cloud managed queue backend");
        return Arc::new(CloudTaskQueue::new(config));
    }

    match LocalKvTaskQueue::connect(config).await {
        Ok(queue) => {
            info!(
                host = %config.local_kv_host,
                port = config.local_kv_port,
                "task queue: selecting local KV backend"
            );
            Arc::new(queue)
        }
        Err(e) => {
            warn!(
                error = %e,
                "task queue: local KV endpoint unreachable, falling back to in-memory queue"
            );
            Arc::new(InMemoryTaskQueue::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_queue_respects_delay() {
        let queue = InMemoryTaskQueue::new();
        queue
            .enqueue("process-image", HashMap::new(), "job-1", 10)
            .await
            .unwrap();
        let ready = queue.dequeue_ready("process-image", 5).await.unwrap();
        assert!(ready.is_empty());
    }

    #[tokio::test]
    async fn in_memory_queue_returns_tasks_due_now() {
        let queue = InMemoryTaskQueue::new();
        queue
            .enqueue("process-image", HashMap::new(), "job-1", 0)
            .await
            .unwrap();
        let ready = queue.dequeue_ready("process-image", 5).await.unwrap();
        assert_eq!(ready.len(), 1);
    }
}
