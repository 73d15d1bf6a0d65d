//! Shared models, configuration and error types for the orchestration core.
//!
//! This crate carries no I/O of its own: it is the vocabulary that `core`'s
//! stores, queue, coordinator and handlers all speak so that they can be
//! wired together and tested independently of any one backend.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::CoreError;
