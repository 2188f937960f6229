//! Structured logging with `tracing`.
//!
//! [`init_subscriber`] installs a compact human-readable formatter on stderr;
//! [`init_json_subscriber`] installs newline-delimited JSON for log shippers.
//! Both honour `RUST_LOG` over the configured level. [`capture_logs`] is for
//! asserting on emitted events in tests.

pub mod test_utils;

pub use test_utils::{CapturedLogs, capture_logs};

use tracing_subscriber::EnvFilter;

/// Output format for the global subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line text.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse a format name (`compact`, `text`, `json`), case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global tracing subscriber with compact stderr output.
///
/// Call once at startup. Later calls are no-ops.
pub fn init_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}

/// Initialize the global tracing subscriber with JSON stderr output.
pub fn init_json_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .with_current_span(false);

    let _ = subscriber.try_init();
}

/// Initialize the global subscriber in the given format.
pub fn init(level: &str, format: LogFormat) {
    match format {
        LogFormat::Compact => init_subscriber(level),
        LogFormat::Json => init_json_subscriber(level),
    }
}
