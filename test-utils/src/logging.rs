//! Logging setup for test binaries
//!
//! The poller and the echo server log through `tracing`. Nothing is printed
//! unless a subscriber is installed, which is what this module is for.

use tracing::Dispatch;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No output
    Silent,
    /// Compact stderr output
    Development,
    /// Verbose diagnostics with source locations
    Debug,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Initialize logging with the specified mode
///
/// # Environment Variables
///
/// - `TEST_UTILS_LOG_LEVEL`: Override log level (error, warn, info, debug, trace)
/// - `RUST_LOG`: Used when `TEST_UTILS_LOG_LEVEL` is not set
///
/// ```rust,ignore
/// test_utils::logging::init_logging(LoggingMode::Debug)?;
/// ```
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::util::SubscriberInitExt;

    match build_dispatch(mode) {
        None => Ok(()),
        Some(dispatch) => dispatch
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
    }
}

/// Build the subscriber for `mode` without installing it
fn build_dispatch(mode: LoggingMode) -> Option<Dispatch> {
    use tracing_subscriber::layer::SubscriberExt;

    match mode {
        LoggingMode::Silent => None,
        LoggingMode::Development => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(create_env_filter("info"));

            Some(Dispatch::new(subscriber))
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
                .with(create_env_filter("debug"));

            Some(Dispatch::new(subscriber))
        }
    }
}

/// Initialize logging from `TEST_UTILS_LOG_MODE`
///
/// - "development" -> LoggingMode::Development
/// - "debug" -> LoggingMode::Debug
///
/// Anything else, including unset, is Silent.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from_env_value(
        std::env::var("TEST_UTILS_LOG_MODE").ok().as_deref(),
    ))
}

/// Install a subscriber that writes through the test harness's capture.
///
/// Safe to call at the top of every test: only the first call installs
/// anything, later calls are no-ops.
pub fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(create_env_filter("debug"))
        .with_test_writer()
        .try_init();
}

/// Check if a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

fn mode_from_env_value(value: Option<&str>) -> LoggingMode {
    match value {
        Some("development") => LoggingMode::Development,
        Some("debug") => LoggingMode::Debug,
        _ => LoggingMode::Silent,
    }
}

/// Create an environment filter with fallback to default level
fn create_env_filter(default_level: &str) -> EnvFilter {
    // TEST_UTILS_LOG_LEVEL first, then RUST_LOG, then the default
    if let Ok(level) = std::env::var("TEST_UTILS_LOG_LEVEL") {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[test]
    fn test_build_dispatch_per_mode() {
        assert!(build_dispatch(LoggingMode::Silent).is_none());

        for mode in [LoggingMode::Development, LoggingMode::Debug] {
            let dispatch = build_dispatch(mode).expect("mode should produce a subscriber");
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::warn!(?mode, "scoped subscriber active");
            });
        }
    }

    #[test]
    fn test_mode_from_env_value() {
        assert_eq!(
            mode_from_env_value(Some("development")),
            LoggingMode::Development
        );
        assert_eq!(mode_from_env_value(Some("debug")), LoggingMode::Debug);
        assert_eq!(mode_from_env_value(Some("verbose")), LoggingMode::Silent);
        assert_eq!(mode_from_env_value(None), LoggingMode::Silent);
    }

    #[test]
    fn test_init_test_logging_is_repeatable() {
        init_test_logging();
        init_test_logging();
        assert!(is_initialized());
    }
}
