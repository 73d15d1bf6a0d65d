//! Process-wide configuration, assembled once at startup from the
//! environment and never re-read afterward.
//!
//! This is the single place that calls `std::env::var` so that the
//! "environment is sampled once" invariant (the Environment Probe's
//! contract) holds structurally rather than by convention alone.

use std::env;
use thiserror::Error;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_WORKER_POOL_SIZE: usize = 5;
const DEFAULT_WEBHOOK_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_LOCAL_KV_PORT: u16 = 6379;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("missing required cloud configuration: {0}")]
    MissingCloudConfig(&'static str),
}

/// Process-wide configuration. Construct once via [`Config::from_env`] and
/// share behind an `Arc` — components must not call `std::env::var`
/// themselves.
#[derive(Debug, Clone)]
pub struct Config {
    pub running_in_cloud: bool,

    /// Base URL the cloud task queue targets for handler delivery.
    pub service_url: Option<String>,

    /// Ceiling on task retries before a task is marked `failed`.
    pub max_retries: u32,

    // Cloud addressing
    pub cloud_project: Option<String>,
    pub cloud_location: String,
    pub cloud_queue: String,
    pub cloud_documents_collection: String,
    pub cloud_documents_endpoint: Option<String>,
    pub cloud_tasks_endpoint: Option<String>,
    pub cloud_bucket: Option<String>,
    pub cloud_artifacts_endpoint: Option<String>,

    // Local addressing
    pub local_kv_host: String,
    pub local_kv_port: u16,
    pub artifact_root: String,

    // HTTP façade / worker pool
    pub http_port: u16,
    pub worker_pool_size: usize,

    // Webhook emitter
    pub webhook_timeout_seconds: u64,
    pub webhook_signing_secret: Option<String>,
}

impl Config {
    /// Read configuration from the process environment. Called exactly
    /// once, at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        let running_in_cloud = env::var("RUNNING_IN_CLOUD")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let max_retries = parse_env_or("MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
        let http_port = parse_env_or("PORT", DEFAULT_HTTP_PORT)?;
        let worker_pool_size = parse_env_or("WORKER_POOL_SIZE", DEFAULT_WORKER_POOL_SIZE)?;
        let webhook_timeout_seconds =
            parse_env_or("WEBHOOK_TIMEOUT_SECONDS", DEFAULT_WEBHOOK_TIMEOUT_SECONDS)?;
        let local_kv_port = parse_env_or("LOCAL_KV_PORT", DEFAULT_LOCAL_KV_PORT)?;

        let config = Self {
            running_in_cloud,
            service_url: env::var("SERVICE_URL").ok(),
            max_retries,
            cloud_project: env::var("GOOGLE_CLOUD_PROJECT").ok(),
            cloud_location: env::var("CLOUD_TASKS_LOCATION")
                .unwrap_or_else(|_| "us-central1".to_string()),
            cloud_queue: env::var("CLOUD_TASKS_QUEUE")
                .unwrap_or_else(|_| "wraith-tasks".to_string()),
            cloud_documents_collection: env::var("CLOUD_JOBS_COLLECTION")
                .unwrap_or_else(|_| "jobs".to_string()),
            cloud_documents_endpoint: env::var("CLOUD_DOCUMENTS_ENDPOINT").ok(),
            cloud_tasks_endpoint: env::var("CLOUD_TASKS_ENDPOINT").ok(),
            cloud_bucket: env::var("CLOUD_ARTIFACT_BUCKET").ok(),
            cloud_artifacts_endpoint: env::var("CLOUD_ARTIFACTS_ENDPOINT").ok(),
            local_kv_host: env::var("LOCAL_KV_HOST").unwrap_or_else(|_| "localhost".to_string()),
            local_kv_port,
            artifact_root: env::var("ARTIFACT_ROOT").unwrap_or_else(|_| "./data".to_string()),
            http_port,
            worker_pool_size,
            webhook_timeout_seconds,
            webhook_signing_secret: env::var("WEBHOOK_SIGNING_SECRET").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.running_in_cloud && self.service_url.is_none() {
            return Err(ConfigError::MissingCloudConfig("SERVICE_URL"));
        }
        if self.running_in_cloud && self.cloud_documents_endpoint.is_none() {
            return Err(ConfigError::MissingCloudConfig("CLOUD_DOCUMENTS_ENDPOINT"));
        }
        if self.running_in_cloud && self.cloud_tasks_endpoint.is_none() {
            return Err(ConfigError::MissingCloudConfig("CLOUD_TASKS_ENDPOINT"));
        }
        if self.running_in_cloud && self.cloud_artifacts_endpoint.is_none() {
            return Err(ConfigError::MissingCloudConfig("CLOUD_ARTIFACTS_ENDPOINT"));
        }
        if self.worker_pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                var: "WORKER_POOL_SIZE",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(var) {
        Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            var,
            value: raw,
            reason: "not a valid integer".to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable mutation races across tests in the same binary;
    // serialize the handful of tests that touch it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in ["RUNNING_IN_CLOUD", "MAX_RETRIES", "SERVICE_URL"] {
            env::remove_var(var);
        }
        let config = Config::from_env().unwrap();
        assert!(!config.running_in_cloud);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn cloud_mode_requires_service_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("RUNNING_IN_CLOUD", "true");
        env::remove_var("SERVICE_URL");
        let result = Config::from_env();
        env::remove_var("RUNNING_IN_CLOUD");
        assert!(matches!(
            result,
            Err(ConfigError::MissingCloudConfig("SERVICE_URL"))
        ));
    }

    #[test]
    fn running_in_cloud_is_case_insensitive() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("RUNNING_IN_CLOUD", "TRUE");
        env::set_var("SERVICE_URL", "https://wraith.example.com");
        env::set_var("CLOUD_DOCUMENTS_ENDPOINT", "https://docs.example.com");
        env::set_var("CLOUD_TASKS_ENDPOINT", "https://tasks.example.com");
        env::set_var("CLOUD_ARTIFACTS_ENDPOINT", "https://artifacts.example.com");
        let config = Config::from_env().unwrap();
        env::remove_var("RUNNING_IN_CLOUD");
        env::remove_var("SERVICE_URL");
        env::remove_var("CLOUD_DOCUMENTS_ENDPOINT");
        env::remove_var("CLOUD_TASKS_ENDPOINT");
        env::remove_var("CLOUD_ARTIFACTS_ENDPOINT");
        assert!(config.running_in_cloud);
    }
}
