//! Task Handlers (C6): addressable at `/tasks/<task_type>/<job_id>`, each
//! implementing the common protocol — auth, load job, transition, work,
//! update, respond.

pub mod batch_crawl;
pub mod cleanup;
pub mod common;
pub mod process_image;

pub use common::{dispatch, AppError, HandlerResponse};
