//! Running counters for a dispatch run.
//!
//! Counters are owned by the dispatcher's single control flow; workers never
//! touch them directly. Results flow through the result queue and are folded
//! in by the dispatcher's drain routine, so `processed == succeeded + failed`
//! holds after every drain regardless of result arrival order.

use serde::{Deserialize, Serialize};

/// A snapshot of run progress handed to the observer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Size of the authoritative pool for the active mode.
    pub total: u64,
    /// Work items with a drained result.
    pub processed: u64,
    /// Items whose unit of work succeeded.
    pub succeeded: u64,
    /// Items whose unit of work failed.
    pub failed: u64,
}

/// Mutable counters for the run in progress.
///
/// All four values start at zero and are monotonically non-decreasing until
/// the run ends.
#[derive(Debug, Default)]
pub struct RunCounters {
    total: u64,
    processed: u64,
    succeeded: u64,
    failed: u64,
}

impl RunCounters {
    /// Fresh counters for a run measuring `total` authoritative items.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Folds one drained result into the counters.
    pub fn record(&mut self, count: u64, success: bool) {
        self.processed += count;
        if success {
            self.succeeded += count;
        } else {
            self.failed += count;
        }
    }

    /// Current values as an immutable snapshot.
    pub fn snapshot(&self) -> Progress {
        Progress {
            total: self.total,
            processed: self.processed,
            succeeded: self.succeeded,
            failed: self.failed,
        }
    }
}
