//! Observer interface consumed by an external control surface.
//!
//! The dispatcher calls observers synchronously from its own control flow,
//! so implementations must return promptly or they stall scheduling.

use crate::dispatch::Progress;
use tracing::{error, info};

/// Receives run events from the dispatcher.
pub trait Observer: Send + Sync {
    /// A human-readable log line.
    fn on_log(&self, message: &str, is_error: bool);

    /// Updated counters after a result was drained (and once at run start).
    fn on_progress(&self, progress: Progress);

    /// The run ended, normally or by stop.
    fn on_finished(&self);
}

/// Observer that routes everything to structured logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_log(&self, message: &str, is_error: bool) {
        if is_error {
            error!("{message}");
        } else {
            info!("{message}");
        }
    }

    fn on_progress(&self, progress: Progress) {
        info!(
            total = progress.total,
            processed = progress.processed,
            succeeded = progress.succeeded,
            failed = progress.failed,
            "Progress"
        );
    }

    fn on_finished(&self) {
        info!("Run finished");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;

    /// Observer that records every event for assertions.
    #[derive(Default)]
    pub struct RecordingObserver {
        pub logs: Mutex<Vec<(String, bool)>>,
        pub progress: Mutex<Vec<Progress>>,
        pub finished: Mutex<u32>,
    }

    impl RecordingObserver {
        pub fn error_logs(&self) -> Vec<String> {
            self.logs
                .lock()
                .iter()
                .filter(|(_, is_error)| *is_error)
                .map(|(message, _)| message.clone())
                .collect()
        }

        pub fn last_progress(&self) -> Option<Progress> {
            self.progress.lock().last().copied()
        }
    }

    impl Observer for RecordingObserver {
        fn on_log(&self, message: &str, is_error: bool) {
            self.logs.lock().push((message.to_string(), is_error));
        }

        fn on_progress(&self, progress: Progress) {
            self.progress.lock().push(progress);
        }

        fn on_finished(&self) {
            *self.finished.lock() += 1;
        }
    }
}
