//! Polling loop
//!
//! The poller invokes a [`Probe`] right away, waits for its [`Reply`], and if
//! the reply was anything but success, sleeps for the configured interval and
//! tries again. It never gives up on its own: the surrounding test is
//! expected to impose a timeout.
//!
//! Three entry points share that loop:
//!
//! - [`poll`] probes once on the calling thread, spawns the rest of the loop
//!   on the current tokio runtime, and calls a completion callback once the
//!   probe succeeds
//! - [`poll_until`] is the loop as a future, for tests that would rather
//!   `.await` than pass a callback
//! - [`poll_blocking`] runs it on the calling thread for sync tests

use std::time::Duration;

use tokio::sync::oneshot::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::config::PollConfig;
use crate::error::{PollError, Result};
use crate::probe::{Probe, Reply, Report};

/// Summary of a finished polling operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Number of times the probe was invoked, including the successful one
    pub attempts: u64,

    /// Number of non-success reports that carried an error
    pub errors: u64,
}

/// Start polling `probe` every `interval` and call `on_complete` once it succeeds.
///
/// The first probe invocation happens on the calling thread before `poll`
/// returns, so a probe that panics right away unwinds into the caller. The
/// rest of the loop runs on a task spawned on the current tokio runtime: the
/// probe is invoked again `interval` after every report that is not a
/// success. Errors attached to a report are ignored. There is no retry limit
/// and no timeout.
///
/// The returned handle resolves after `on_complete` has run. If the probe
/// panics on a later attempt, the polling task dies, `on_complete` is never
/// called, and awaiting the handle yields the panic.
///
/// # Errors
///
/// Returns [`PollError::NoRuntime`] when called outside a tokio runtime.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tokio::sync::oneshot;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), test_utils::PollError> {
/// let (done, finished) = oneshot::channel();
///
/// test_utils::poll(
///     |reply: test_utils::Reply| reply.report(None, true),
///     Duration::from_millis(100),
///     move || {
///         let _ = done.send(());
///     },
/// )?;
///
/// finished.await.unwrap();
/// # Ok(())
/// # }
/// ```
pub fn poll<P, F>(mut probe: P, interval: Duration, on_complete: F) -> Result<JoinHandle<()>>
where
    P: Probe,
    F: FnOnce() + Send + 'static,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| PollError::NoRuntime)?;

    let first = invoke(&mut probe, 1);

    Ok(handle.spawn(async move {
        let outcome = drive(probe, interval, first).await;
        debug!(
            attempts = outcome.attempts,
            errors = outcome.errors,
            "Poll complete"
        );
        on_complete();
    }))
}

/// [`poll`] with the interval taken from a [`PollConfig`]
pub fn poll_with<P, F>(config: PollConfig, probe: P, on_complete: F) -> Result<JoinHandle<()>>
where
    P: Probe,
    F: FnOnce() + Send + 'static,
{
    poll(probe, config.interval, on_complete)
}

/// Poll `probe` every `interval` until it reports success.
///
/// Same contract as [`poll`], expressed as a future. A panicking probe
/// unwinds through the awaiting caller.
pub async fn poll_until<P>(mut probe: P, interval: Duration) -> PollOutcome
where
    P: Probe,
{
    let first = invoke(&mut probe, 1);
    drive(probe, interval, first).await
}

/// Run one probe invocation and hand back the receiver for its reply
fn invoke<P>(probe: &mut P, attempt: u64) -> oneshot::Receiver<Report>
where
    P: Probe,
{
    let (reply, rx) = Reply::channel();

    trace!(attempt, "Invoking probe");
    probe.check(reply);

    rx
}

/// Wait on the pending reply of attempt one and keep polling until success
async fn drive<P>(
    mut probe: P,
    interval: Duration,
    mut pending: oneshot::Receiver<Report>,
) -> PollOutcome
where
    P: Probe,
{
    let mut outcome = PollOutcome {
        attempts: 1,
        errors: 0,
    };

    loop {
        if settle(pending.await, &mut outcome) {
            return outcome;
        }

        tokio::time::sleep(interval).await;

        outcome.attempts += 1;
        pending = invoke(&mut probe, outcome.attempts);
    }
}

/// [`poll_until`] with the interval taken from a [`PollConfig`]
pub async fn poll_until_with<P>(config: PollConfig, probe: P) -> PollOutcome
where
    P: Probe,
{
    poll_until(probe, config.interval).await
}

/// Poll `probe` on the calling thread, then call `on_complete`.
///
/// Blocks until the probe succeeds, sleeping the thread between attempts.
/// The probe may still hand its reply to another thread and report from
/// there.
///
/// # Panics
///
/// Panics if called from within an asynchronous execution context; use
/// [`poll`] or [`poll_until`] there. A panicking probe unwinds through the
/// caller.
pub fn poll_blocking<P, F>(mut probe: P, interval: Duration, on_complete: F) -> PollOutcome
where
    P: Probe,
    F: FnOnce(),
{
    let mut outcome = PollOutcome::default();

    loop {
        outcome.attempts += 1;
        let rx = invoke(&mut probe, outcome.attempts);

        if settle(rx.blocking_recv(), &mut outcome) {
            break;
        }

        std::thread::sleep(interval);
    }

    debug!(
        attempts = outcome.attempts,
        errors = outcome.errors,
        "Poll complete"
    );
    on_complete();
    outcome
}

/// Account for one reply and decide whether polling is done
fn settle(received: std::result::Result<Report, RecvError>, outcome: &mut PollOutcome) -> bool {
    let attempt = outcome.attempts;

    match received {
        Ok(Report {
            succeeded: true, ..
        }) => {
            debug!(attempt, "Probe succeeded");
            true
        }
        Ok(Report {
            error: Some(error), ..
        }) => {
            outcome.errors += 1;
            trace!(attempt, %error, "Probe reported an error, retrying");
            false
        }
        Ok(Report { error: None, .. }) => {
            trace!(attempt, "Probe not ready, retrying");
            false
        }
        Err(_) => {
            warn!(attempt, "Probe dropped its reply without reporting, retrying");
            false
        }
    }
}
