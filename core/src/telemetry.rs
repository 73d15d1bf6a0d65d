//! Tracing initialization, mirroring the teacher's `main.rs` registry/layer
//! setup: an `EnvFilter` layer with a sensible default plus a formatting
//! layer, both installed once at process startup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "core=info,tower_http=info,axum=info";

/// Install the global tracing subscriber. Must be called exactly once,
/// before any other component logs.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
