//! Tracing initialization for embedders.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber with an fmt layer and a
/// `RUST_LOG`-style env filter, defaulting to `clipseek=info`. Safe to
/// call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clipseek=info")))
        .try_init();
}
