//! Tracing subscriber setup for the binary.
//!
//! Library code only emits `tracing` events; nothing is printed unless a subscriber is
//! installed here. Output goes to stderr so streamed tokens on stdout stay clean.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::DEFAULT_LOG_FILTER;

/// Build the filter, falling back to the default directive when `directive` is invalid.
pub fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(directive: &str) {
    let subscriber = tracing_subscriber::registry().with(env_filter(directive)).with(
        fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr),
    );
    let _ = tracing::subscriber::set_global_default(subscriber);
}
