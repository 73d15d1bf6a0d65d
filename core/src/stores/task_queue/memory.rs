//! In-memory Task Queue: the fallback backend when the local KV endpoint
//! is unreachable at startup. One Vec<Task> per task type behind a mutex.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::models::task::Task;
use common::CoreError;

use super::TaskQueue;

pub struct InMemoryTaskQueue {
    tasks: Mutex<HashMap<String, Vec<Task>>>,
}

impl InMemoryTaskQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_err() -> CoreError {
    CoreError::BackendUnavailable("in-memory task queue poisoned".into())
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(
        &self,
        task_type: &str,
        payload: HashMap<String, serde_json::Value>,
        job_id: &str,
        delay_seconds: i64,
    ) -> Result<String, CoreError> {
        let task = Task::new(task_type.to_string(), job_id.to_string(), payload, delay_seconds);
        let task_id = task.task_id.clone();
        self.tasks
            .lock()
            .map_err(|_| lock_err())?
            .entry(task_type.to_string())
            .or_default()
            .push(task);
        Ok(task_id)
    }

    async fn dequeue_ready(&self, task_type: &str, max: usize) -> Result<Vec<Task>, CoreError> {
        let tasks = self.tasks.lock().map_err(|_| lock_err())?;
        let now = Utc::now();
        let mut ready: Vec<Task> = tasks
            .get(task_type)
            .map(|v| v.iter().filter(|t| t.is_ready(now)).cloned().collect())
            .unwrap_or_default();
        ready.sort_by_key(|t| t.execute_at);
        ready.truncate(max);
        Ok(ready)
    }

    async fn remove(&self, task_type: &str, task_id: &str) -> Result<(), CoreError> {
        let mut tasks = self.tasks.lock().map_err(|_| lock_err())?;
        if let Some(v) = tasks.get_mut(task_type) {
            v.retain(|t| t.task_id != task_id);
        }
        Ok(())
    }

    async fn reschedule(
        &self,
        task_type: &str,
        task_id: &str,
        new_execute_at: DateTime<Utc>,
        new_retry_count: u32,
    ) -> Result<(), CoreError> {
        let mut tasks = self.tasks.lock().map_err(|_| lock_err())?;
        if let Some(v) = tasks.get_mut(task_type) {
            if let Some(task) = v.iter_mut().find(|t| t.task_id == task_id) {
                task.retry_count = new_retry_count;
                task.execute_at = new_execute_at;
            }
        }
        Ok(())
    }

    async fn known_task_types(&self) -> Result<Vec<String>, CoreError> {
        let tasks = self.tasks.lock().map_err(|_| lock_err())?;
        Ok(tasks.keys().cloned().collect())
    }
}
