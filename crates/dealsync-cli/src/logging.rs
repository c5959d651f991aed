//! stderr diagnostics for the CLI.
//!
//! stdout carries the computation output, so every log line goes to stderr.
//! `RUST_LOG` wins over `--log-level` when set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

pub fn init_logging(log_level: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(build_filter(log_level))
        .with(fmt_layer)
        .try_init();

    tracing::debug!(log_level = %log_level, "logging initialized");
}
