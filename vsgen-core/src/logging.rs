use std::io::{self, IsTerminal};
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the logging system with JSON formatting and environment-based filtering
///
/// Uses `RUST_LOG` for filtering (defaults to "info" if not set) and writes
/// flattened JSON events to stderr so stdout stays free for documents.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .json()
        .flatten_event(true)
        .init();
}

pub fn default_log_mode() -> LogMode {
    if io::stdout().is_terminal() {
        LogMode::Pretty
    } else {
        LogMode::Plain
    }
}

/// How reports are rendered for a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Plain,
    Pretty,
}
