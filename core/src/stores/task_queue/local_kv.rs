//! Redis-backed Task Queue for local development. Each task type gets a
//! sorted set `task_queue:ready:<task_type>` scored by `execute_at` (Unix
//! seconds), with the serialized `Task` stored separately under
//! `task_queue:task:<task_id>`. Known task types are tracked in the set
//! `task_queue:types` so the dispatcher knows what to poll.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::models::task::Task;
use common::{Config, CoreError};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::TaskQueue;

const TYPES_KEY: &str = "task_queue:types";

pub struct LocalKvTaskQueue {
    conn: ConnectionManager,
}

impl LocalKvTaskQueue {
    pub async fn connect(config: &Config) -> Result<Self, CoreError> {
        let url = format!("redis://{}:{}", config.local_kv_host, config.local_kv_port);
        let client = redis::Client::open(url)
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        Ok(Self { conn })
    }

    fn ready_set_key(task_type: &str) -> String {
        format!("task_queue:ready:{task_type}")
    }

    fn task_key(task_id: &str) -> String {
        format!("task_queue:task:{task_id}")
    }
}

#[async_trait]
impl TaskQueue for LocalKvTaskQueue {
    async fn enqueue(
        &self,
        task_type: &str,
        payload: HashMap<String, serde_json::Value>,
        job_id: &str,
        delay_seconds: i64,
    ) -> Result<String, CoreError> {
        let task = Task::new(task_type.to_string(), job_id.to_string(), payload, delay_seconds);
        let task_id = task.task_id.clone();
        let serialized = serde_json::to_string(&task)?;
        let score = task.execute_at.timestamp() as f64;

        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(Self::task_key(&task_id), serialized)
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        conn.zadd::<_, _, _, ()>(Self::ready_set_key(task_type), &task_id, score)
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        conn.sadd::<_, _, ()>(TYPES_KEY, task_type)
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        Ok(task_id)
    }

    async fn dequeue_ready(&self, task_type: &str, max: usize) -> Result<Vec<Task>, CoreError> {
        let mut conn = self.conn.clone();
        let now = Utc::now().timestamp() as f64;
        let ids: Vec<String> = conn
            .zrangebyscore_limit(Self::ready_set_key(task_type), f64::NEG_INFINITY, now, 0, max as isize)
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        let mut tasks = Vec::with_capacity(ids.len());
        for id in ids {
            let raw: Option<String> = conn
                .get(Self::task_key(&id))
                .await
                .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
            if let Some(raw) = raw {
                tasks.push(serde_json::from_str::<Task>(&raw)?);
            }
        }
        tasks.sort_by_key(|t| t.execute_at);
        Ok(tasks)
    }

    async fn remove(&self, task_type: &str, task_id: &str) -> Result<(), CoreError> {
        let mut conn = self.conn.clone();
        conn.zrem::<_, _, ()>(Self::ready_set_key(task_type), task_id)
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        conn.del::<_, ()>(Self::task_key(task_id))
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn reschedule(
        &self,
        task_type: &str,
        task_id: &str,
        new_execute_at: DateTime<Utc>,
        new_retry_count: u32,
    ) -> Result<(), CoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(Self::task_key(task_id))
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        let mut task: Task = match raw {
            Some(raw) => serde_json::from_str(&raw)?,
            None => return Err(CoreError::NotFound(format!("task {task_id}"))),
        };
        task.retry_count = new_retry_count;
        task.execute_at = new_execute_at;
        let serialized = serde_json::to_string(&task)?;

        conn.set::<_, _, ()>(Self::task_key(task_id), serialized)
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        conn.zadd::<_, _, _, ()>(
            Self::ready_set_key(task_type),
            task_id,
            new_execute_at.timestamp() as f64,
        )
        .await
        .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn known_task_types(&self) -> Result<Vec<String>, CoreError> {
        let mut conn = self.conn.clone();
        let types: Vec<String> = conn
            .smembers(TYPES_KEY)
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;
        Ok(types)
    }
}
