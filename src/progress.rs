//! Progress reporting and cooperative cancellation.
//!
//! Long-running analyses accept a `&mut dyn ProgressMonitor`. They call
//! [`ProgressMonitor::report`] as work advances and poll
//! [`ProgressMonitor::is_cancelled`] between units of work (one face, one
//! edge, one node). A cancelled run stops early and returns whatever it has
//! produced so far together with [`Completion::Cancelled`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Receives progress updates and answers cancellation polls.
pub trait ProgressMonitor {
    /// Called after `done` of `total` units of `stage` are processed.
    fn report(&mut self, _done: usize, _total: usize, _stage: &str) {}

    /// Returns `true` once the caller wants the analysis to stop.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Monitor that ignores progress and never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMonitor;

impl ProgressMonitor for NoopMonitor {}

/// Shareable cancellation switch.
///
/// Clones share the same flag, so one handle can be moved to another thread
/// and flipped while the analysis polls the other.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl ProgressMonitor for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.is_set()
    }
}

/// Whether an analysis ran to the end or was interrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Completion {
    Finished,
    Cancelled,
}

impl Completion {
    #[inline]
    pub fn is_cancelled(self) -> bool {
        self == Completion::Cancelled
    }
}

/// Polls `monitor` and reports `done/total`; returns `true` if cancelled.
pub(crate) fn checkpoint(
    monitor: &mut dyn ProgressMonitor,
    done: usize,
    total: usize,
    stage: &str,
) -> bool {
    if monitor.is_cancelled() {
        log::info!("{stage}: cancelled after {done}/{total}");
        return true;
    }
    monitor.report(done, total, stage);
    false
}
