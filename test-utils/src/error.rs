//! Error types for the test-utils crate.

/// Errors returned by the polling entry points.
///
/// Note that nothing a probe reports ever turns into a `PollError`: a probe
/// error only means "not yet", and the poller keeps going.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// `poll` needs a tokio runtime to spawn the polling task on
    #[error("No tokio runtime available to drive the polling task")]
    NoRuntime,

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors from the echo server fixture.
#[derive(Debug, thiserror::Error)]
pub enum EchoError {
    /// Failed to bind the listening socket
    #[error("Failed to bind echo server: {0}")]
    Bind(#[from] std::io::Error),

    /// The accept loop did not end cleanly
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

/// Convenience type alias for Results using PollError.
pub type Result<T> = std::result::Result<T, PollError>;
