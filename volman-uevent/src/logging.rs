//! Logging initialization for the daemon and tools.
//!
//! Thin wrapper over `tracing-subscriber` so every front-end configures
//! output the same way.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different environments.
#[derive(Debug, Clone, Copy)]
pub enum LoggingMode {
    /// No output
    Silent,
    /// Compact stderr output for a running daemon
    Daemon,
    /// Verbose diagnostics with source locations
    Debug,
}

/// Logging configuration error.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Initialize logging with the specified mode.
///
/// Call once, early, before anything emits events.
///
/// # Environment Variables
///
/// - `VOLMAN_LOG_LEVEL`: override the level filter (error, warn, info, debug, trace)
/// - `RUST_LOG`: standard fallback filter
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Daemon => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(env_filter("info"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(env_filter("debug"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize from the `VOLMAN_LOG_MODE` environment variable
/// (`silent` / `daemon` / `debug`), defaulting to daemon output.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = match std::env::var("VOLMAN_LOG_MODE").as_deref() {
        Ok("silent") => LoggingMode::Silent,
        Ok("debug") => LoggingMode::Debug,
        _ => LoggingMode::Daemon,
    };

    init_logging(mode)
}

fn env_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var("VOLMAN_LOG_LEVEL") {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}
