//! Logging Initialization
//!
//! Installs an env-filtered stdout subscriber. Embedding applications call
//! this once at startup; calling it again is a no-op.

use tracing_subscriber::prelude::*;

/// Initializes the global tracing subscriber.
///
/// Filter defaults to `info` and is overridable via `RUST_LOG`
/// (e.g. `RUST_LOG=automontage=debug`).
pub fn init() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(true);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    // A subscriber may already be installed (tests, embedding host).
    let _ = tracing::subscriber::set_global_default(subscriber);
}
