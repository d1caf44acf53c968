//! # test-utils
//!
//! Helpers for test suites that wait on something outside their control.
//!
//! Fixed sleeps in tests are unreliable: whatever they wait for sometimes
//! takes longer, especially on CI. Polling keeps a test as short as possible
//! instead. [`poll`] invokes a probe right away and, until the probe reports
//! success, again after every interval; then it calls the completion
//! callback exactly once.
//!
//! ```rust
//! use std::time::Duration;
//! use test_utils::Reply;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (done, finished) = tokio::sync::oneshot::channel();
//!
//! test_utils::poll(
//!     |reply: Reply| reply.report(None, true),
//!     Duration::from_millis(100),
//!     move || {
//!         let _ = done.send(());
//!     },
//! )
//! .unwrap();
//!
//! finished.await.unwrap();
//! # }
//! ```
//!
//! Polling has no timeout of its own; wrap the wait in
//! `tokio::time::timeout` or rely on the test harness.

pub mod config;
pub mod echo;
pub mod error;
pub mod logging;
mod poll;
mod probe;

pub use config::PollConfig;
pub use echo::EchoServer;
pub use error::{EchoError, PollError, Result};
pub use poll::{poll, poll_blocking, poll_until, poll_until_with, poll_with, PollOutcome};
pub use probe::{probe_fn, Probe, ProbeError, Reply};
