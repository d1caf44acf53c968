//! Probe and reply types
//!
//! A probe is the check being polled. Every time the poller invokes it, the
//! probe receives a fresh [`Reply`] and must eventually report through it,
//! either right away or later from another task or thread.

use std::fmt;

use tokio::sync::oneshot;

/// Error a probe may attach to a non-success report.
///
/// The poller accepts it but never acts on it.
pub type ProbeError = Box<dyn std::error::Error + Send + Sync>;

/// A single report delivered through a [`Reply`]
#[derive(Debug)]
pub(crate) struct Report {
    /// Only `true` completes the poll
    pub(crate) succeeded: bool,

    /// Error that accompanied the report, if any
    pub(crate) error: Option<ProbeError>,
}

/// One-shot continuation handed to each probe invocation.
///
/// Reporting consumes the reply, so one invocation can report at most once.
/// Dropping a reply without reporting counts as "not yet succeeded".
pub struct Reply {
    tx: oneshot::Sender<Report>,
}

impl Reply {
    /// Create a reply and the receiver the poller waits on
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Report>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Report the outcome of this check.
    ///
    /// `error` is accepted for the benefit of probes that forward a fallible
    /// operation's result; it does not change what the poller does. Only
    /// `succeeded == true` completes the poll.
    pub fn report(self, error: Option<ProbeError>, succeeded: bool) {
        // The receiver is gone only if the polling task was torn down.
        let _ = self.tx.send(Report { succeeded, error });
    }

    /// Report success, completing the poll
    pub fn success(self) {
        self.report(None, true);
    }

    /// Report that the condition does not hold yet
    pub fn pending(self) {
        self.report(None, false);
    }

    /// Report a failed check; the poller retries exactly as for [`Reply::pending`]
    pub fn failed<E>(self, error: E)
    where
        E: Into<ProbeError>,
    {
        self.report(Some(error.into()), false);
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// A check that the poller invokes until it reports success.
///
/// Implemented for every `FnMut(Reply)` closure, so most callers never
/// implement it by hand:
///
/// ```rust
/// use test_utils::{Probe, Reply};
///
/// fn assert_probe<P: Probe>(_: P) {}
///
/// assert_probe(|reply: Reply| reply.success());
/// ```
pub trait Probe: Send + 'static {
    /// Run the check once and report through `reply`
    fn check(&mut self, reply: Reply);
}

impl<F> Probe for F
where
    F: FnMut(Reply) + Send + 'static,
{
    fn check(&mut self, reply: Reply) {
        self(reply)
    }
}

/// Turn a synchronous predicate into a probe that reports immediately.
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let ready = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&ready);
/// let _probe = test_utils::probe_fn(move || flag.load(Ordering::SeqCst));
/// ```
pub fn probe_fn<F>(mut predicate: F) -> impl Probe
where
    F: FnMut() -> bool + Send + 'static,
{
    move |reply: Reply| {
        if predicate() {
            reply.success();
        } else {
            reply.pending();
        }
    }
}
