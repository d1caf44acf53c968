//! Integration test for global logging setup.
//!
//! A global subscriber can be installed once per process, so this lives in
//! its own test binary and runs as a single test.

use test_utils::logging::{
    init_logging, init_logging_from_env, is_initialized, LoggingError, LoggingMode,
};

#[test]
fn test_init_logging_from_env_installs_once() {
    std::env::set_var("TEST_UTILS_LOG_MODE", "development");

    assert!(!is_initialized());
    init_logging_from_env().expect("development subscriber should install");
    assert!(is_initialized());

    tracing::info!("logged through the development subscriber");

    match init_logging(LoggingMode::Debug) {
        Err(LoggingError::TracingInit(_)) => {}
        other => panic!("Expected TracingInit error, got {other:?}"),
    }

    // Silent never touches the global subscriber
    assert!(init_logging(LoggingMode::Silent).is_ok());
}
