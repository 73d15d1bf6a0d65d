//! Process-wide application state, assembled once in `main` and shared
//! behind an `Arc` across every axum handler and the dispatcher task.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use common::Config;
use reqwest::Client;

use crate::crawler::Crawler;
use crate::ocr::OcrEngine;
use crate::stores::{ArtifactStore, JobStore, TaskQueue};

#[derive(Clone)]
pub struct AppState(pub Arc<AppStateInner>);

pub struct AppStateInner {
    pub config: Arc<Config>,
    pub job_store: Arc<dyn JobStore>,
    pub task_queue: Arc<dyn TaskQueue>,
    pub artifact_store: Arc<dyn ArtifactStore>,
    pub crawler: Arc<dyn Crawler>,
    pub ocr: Arc<dyn OcrEngine>,
    pub http_client: Client,
    /// Guards against starting the dispatcher loop twice in one process.
    pub dispatcher_started: AtomicBool,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        job_store: Arc<dyn JobStore>,
        task_queue: Arc<dyn TaskQueue>,
        artifact_store: Arc<dyn ArtifactStore>,
        crawler: Arc<dyn Crawler>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self(Arc::new(AppStateInner {
            config,
            job_store,
            task_queue,
            artifact_store,
            crawler,
            ocr,
            http_client: Client::new(),
            dispatcher_started: AtomicBool::new(false),
        }))
    }
}

impl std::ops::Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
