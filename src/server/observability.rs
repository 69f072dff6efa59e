//! Structured logging and tracing configuration.
//!
//! Provides setup for observability using the `tracing` crate with:
//! - Structured logging with JSON output option
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Spans for requests and rebuild events

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Initialize tracing.
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Panics
///
/// Panics if tracing subscriber has already been initialized in this process.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!("Tracing initialized: level={}, json={}", level, json);
}

/// Span helpers shared by the server and the watch loop.
pub mod spans {
    use tracing::{info_span, Span};

    /// Span for one HTTP request.
    #[must_use]
    pub fn request_span(method: &str, uri: &str, request_id: &str) -> Span {
        info_span!(
            "request",
            method = %method,
            uri = %uri,
            request_id = %request_id,
        )
    }

    /// Span for handling one watch event.
    #[must_use]
    pub fn event_span(path: &std::path::Path, kind: &str) -> Span {
        info_span!(
            "watch_event",
            path = %path.display(),
            kind = %kind,
        )
    }
}
