//! Error taxonomy shared by every component of the orchestration core.
//!
//! Variants line up with the failure taxonomy in the system design:
//! validation errors and not-found are caller mistakes, `Unauthorized` is an
//! auth failure on an internal task endpoint, `BackendUnavailable` covers a
//! job/task/artifact store that can't be reached, `HandlerInternal` is a
//! per-item failure captured inside a batch, and `RetriableTransient` is
//! something the task queue's own backoff should deal with.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("handler error: {0}")]
    HandlerInternal(String),

    #[error("transient error, will retry: {0}")]
    RetriableTransient(String),
}

impl CoreError {
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, CoreError::RetriableTransient(_))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Validation(e.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::BackendUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_classification() {
        assert!(CoreError::RetriableTransient("timeout".into()).is_retriable());
        assert!(!CoreError::NotFound("job-1".into()).is_retriable());
    }

    #[test]
    fn display_messages_are_prefixed() {
        let e = CoreError::Validation("urls must not exceed 50".into());
        assert_eq!(e.to_string(), "validation error: urls must not exceed 50");
    }
}
