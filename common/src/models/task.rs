//! Task entity: a single scheduled execution against a Job, representing
//! one delivery attempt of work.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Local-mode task status. The cloud queue backend tracks delivery state
/// itself and does not populate this field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A single scheduled execution against a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub task_type: String,
    pub job_id: String,

    /// Opaque payload forwarded verbatim to the handler.
    #[serde(default)]
    pub payload: HashMap<String, Value>,

    pub created_at: DateTime<Utc>,
    pub execute_at: DateTime<Utc>,

    #[serde(default)]
    pub retry_count: u32,

    #[serde(default = "default_task_status")]
    pub status: TaskStatus,

    #[serde(default)]
    pub error: Option<String>,
}

fn default_task_status() -> TaskStatus {
    TaskStatus::Pending
}

impl Task {
    #[must_use]
    pub fn new(
        task_type: impl Into<String>,
        job_id: impl Into<String>,
        payload: HashMap<String, Value>,
        delay_seconds: i64,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            task_id: Uuid::new_v4().to_string(),
            task_type: task_type.into(),
            job_id: job_id.into(),
            payload,
            created_at,
            execute_at: created_at + Duration::seconds(delay_seconds.max(0)),
            retry_count: 0,
            status: TaskStatus::Pending,
            error: None,
        }
    }

    /// Linear backoff: `execute_at = now + 30s * retry_count`, matching the
    /// task queue's retry policy.
    #[must_use]
    pub fn next_attempt_execute_at(retry_count: u32) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(30 * i64::from(retry_count))
    }

    #[must_use]
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.execute_at <= now
    }

    #[must_use]
    pub fn retries_exhausted(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_schedules_in_the_future() {
        let task = Task::new("process-image", "job-1", HashMap::new(), 30);
        assert!(task.execute_at >= task.created_at);
        assert_eq!(task.retry_count, 0);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn zero_delay_is_immediately_ready() {
        let task = Task::new("batch-crawl", "job-2", HashMap::new(), 0);
        assert!(task.is_ready(Utc::now() + Duration::milliseconds(10)));
    }

    #[test]
    fn negative_delay_clamps_to_zero() {
        let task = Task::new("cleanup-old-jobs", "job-3", HashMap::new(), -5);
        assert!(task.execute_at <= Utc::now() + Duration::seconds(1));
    }

    #[test]
    fn retry_backoff_is_linear_and_strictly_increasing() {
        let mut last = Utc::now();
        for retry_count in 1..=3u32 {
            let next = Task::next_attempt_execute_at(retry_count);
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn retries_exhausted_at_max() {
        let mut task = Task::new("process-image", "job-4", HashMap::new(), 0);
        task.retry_count = 3;
        assert!(task.retries_exhausted(3));
        task.retry_count = 2;
        assert!(!task.retries_exhausted(3));
    }
}
