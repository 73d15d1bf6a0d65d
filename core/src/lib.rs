//! Gnosis Wraith orchestration core: job store, task queue, artifact
//! store, local dispatcher, task handlers, batch coordinator, webhook
//! emitter, and the axum router that exposes them over HTTP.

pub mod coordinator;
pub mod crawler;
pub mod dispatcher;
pub mod env;
pub mod handlers;
pub mod ocr;
pub mod routes;
pub mod state;
pub mod stores;
pub mod telemetry;
pub mod webhook;

pub use state::AppState;
