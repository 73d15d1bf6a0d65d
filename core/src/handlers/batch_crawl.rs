//! `batch-crawl` task handler: runs the same fan-out the synchronous
//! batch path uses, for jobs submitted with `async=true`.

use std::collections::HashMap;

use async_trait::async_trait;
use common::models::job::Job;
use common::CoreError;
use serde_json::Value;

use crate::coordinator;
use crate::handlers::common::{HandlerResponse, TaskHandler};
use crate::state::AppState;

pub struct BatchCrawlHandler;

#[async_trait]
impl TaskHandler for BatchCrawlHandler {
    async fn handle(
        &self,
        state: &AppState,
        job: &Job,
        _payload: HashMap<String, Value>,
    ) -> Result<HandlerResponse, CoreError> {
        coordinator::run_for_job(state, job).await
    }
}
