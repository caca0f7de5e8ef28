/*!
 * Progress reporting for a scheduling run.
 *
 * One tracker is shared by every batch task of a run. Completed counts only
 * ever grow; the observer is called after each increment with the new
 * `(completed, total)` pair.
 */

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Callback receiving `(completed, total)` unit counts
pub type ProgressObserver = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Shared completed-unit counter with an optional observer
#[derive(Clone)]
pub struct ProgressTracker {
    completed: Arc<AtomicUsize>,
    total: usize,
    observer: Option<ProgressObserver>,
}

impl ProgressTracker {
    /// Start a tracker at `already_done` out of `total` units
    pub fn new(already_done: usize, total: usize, observer: Option<ProgressObserver>) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(already_done)),
            total,
            observer,
        }
    }

    /// A tracker nobody listens to
    pub fn silent(total: usize) -> Self {
        Self::new(0, total, None)
    }

    /// Mark `count` more units as resolved and notify the observer
    pub fn advance(&self, count: usize) {
        if count == 0 {
            return;
        }
        let completed = self.completed.fetch_add(count, Ordering::SeqCst) + count;
        if let Some(observer) = &self.observer {
            observer(completed.min(self.total), self.total);
        }
    }

    /// Re-send the current counts to the observer without advancing
    pub fn report(&self) {
        if let Some(observer) = &self.observer {
            observer(self.completed(), self.total);
        }
    }

    /// Units resolved so far
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst).min(self.total)
    }

    /// Total units in the run
    pub fn total(&self) -> usize {
        self.total
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("completed", &self.completed())
            .field("total", &self.total)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}
