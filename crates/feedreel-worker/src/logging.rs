//! Tracing setup and structured run logging.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_TARGETS: &[&str] = &[
    "feedreel",
    "feedreel_worker",
    "feedreel_feed",
    "feedreel_media",
    "ffmpeg",
];

/// Install the global subscriber.
///
/// `RUST_LOG` is honored; otherwise the crate logs at `info`, or `debug`
/// when `debug` is set. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(debug: bool) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let default_level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            LOG_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, default_level))
                .collect::<Vec<_>>()
                .join(","),
        )
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(debug)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Run logger carrying the source label on every event.
#[derive(Debug, Clone)]
pub struct RunLogger {
    source: String,
    operation: String,
}

impl RunLogger {
    pub fn new(source: impl Into<String>, operation: &str) -> Self {
        Self {
            source: source.into(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            source = %self.source,
            operation = %self.operation,
            "Run started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            source = %self.source,
            operation = %self.operation,
            "{}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            source = %self.source,
            operation = %self.operation,
            "{}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            source = %self.source,
            operation = %self.operation,
            "{}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            source = %self.source,
            operation = %self.operation,
            "Run completed: {}", message
        );
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            source = %self.source,
            operation = %self.operation
        )
    }
}
