//! Shutdown coordination: reclaim, terminate, and clean up.
//!
//! The coordinator runs on an explicit stop request and again at normal run
//! completion. It must always complete: failures along the way are logged
//! and never propagated, and no path may leave live slots unaccounted for.
//! The routine is re-entrant; a second invocation finds an empty live set
//! and produces no duplicate reclaim entries.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cleanup::{BrowserReaper, ProfileReaper};
use crate::observer::Observer;
use crate::pools::RecoverySink;

use super::dispatcher::{SlotAssignments, SlotHandle};

/// Grace period for a force-killed slot to actually go away.
const ABORT_GRACE: Duration = Duration::from_secs(1);

/// Terminates live slots, reclaims their unfinished work, and invokes the
/// external cleanup collaborators.
pub struct ShutdownCoordinator {
    pub(crate) observer: Arc<dyn Observer>,
    pub(crate) sink: RecoverySink,
    pub(crate) browser_reaper: Arc<dyn BrowserReaper>,
    pub(crate) profile_reaper: Arc<dyn ProfileReaper>,
    pub(crate) shutdown_timeout: Duration,
    pub(crate) profiles_dir: PathBuf,
    pub(crate) scan_roots: Vec<PathBuf>,
    pub(crate) data_centric: bool,
}

impl ShutdownCoordinator {
    /// Runs the full shutdown sequence.
    pub(crate) async fn run(
        &self,
        running: &AtomicBool,
        shutdown_tx: &broadcast::Sender<()>,
        slots: &mut Vec<SlotHandle>,
        assignments: &mut SlotAssignments,
    ) {
        // Unstick the spawn loop and both polling waits promptly.
        running.store(false, Ordering::SeqCst);

        self.reclaim(slots, assignments).await;
        self.terminate(shutdown_tx, slots).await;
        assignments.clear_all();

        self.invoke_reapers().await;
    }

    /// Writes every live slot's unfinished chunk back to the recovery sink
    /// so no in-flight data item is silently lost.
    async fn reclaim(&self, slots: &[SlotHandle], assignments: &mut SlotAssignments) {
        if !self.data_centric {
            return;
        }

        for slot_handle in slots {
            if slot_handle.handle.is_finished() {
                continue;
            }
            let Some(chunk) = assignments.take(slot_handle.slot) else {
                continue;
            };
            if chunk.is_empty() {
                continue;
            }

            match self.sink.append(&chunk).await {
                Ok(()) => self.observer.on_log(
                    &format!(
                        "Reclaimed {} data items from slot {}",
                        chunk.len(),
                        slot_handle.slot
                    ),
                    false,
                ),
                // Best effort: shutdown proceeds even when the sink fails.
                Err(e) => self.observer.on_log(
                    &format!(
                        "Failed to write reclaimed items from slot {}: {e}",
                        slot_handle.slot
                    ),
                    true,
                ),
            }
        }
    }

    /// Graceful terminate, bounded join, then forced kill.
    async fn terminate(&self, shutdown_tx: &broadcast::Sender<()>, slots: &mut Vec<SlotHandle>) {
        if slots.is_empty() {
            return;
        }

        // Send errors only mean every receiver is already gone.
        let _ = shutdown_tx.send(());

        let deadline = Instant::now() + self.shutdown_timeout;
        let mut stragglers = Vec::new();

        for mut slot_handle in slots.drain(..) {
            let was_alive = !slot_handle.handle.is_finished();
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, &mut slot_handle.handle).await {
                Ok(Ok(())) => {
                    if was_alive {
                        self.observer
                            .on_log(&format!("Terminated slot {}", slot_handle.slot), false);
                    }
                }
                Ok(Err(e)) => {
                    if e.is_panic() {
                        warn!(slot = slot_handle.slot, "Slot panicked during shutdown");
                    }
                }
                Err(_) => stragglers.push(slot_handle),
            }
        }

        for slot_handle in stragglers {
            slot_handle.handle.abort();
            match tokio::time::timeout(ABORT_GRACE, slot_handle.handle).await {
                Ok(_) => self
                    .observer
                    .on_log(&format!("Force-killed slot {}", slot_handle.slot), false),
                Err(_) => {
                    // Nothing more the coordinator can safely do from here.
                    warn!(
                        slot = slot_handle.slot,
                        "Slot still alive after forced kill"
                    );
                }
            }
        }
    }

    /// Invokes the browser-process and profile-directory reapers.
    ///
    /// Both scan the system and the filesystem, so they run off the async
    /// control flow.
    async fn invoke_reapers(&self) {
        let reaper = Arc::clone(&self.browser_reaper);
        let roots = self.scan_roots.clone();
        match tokio::task::spawn_blocking(move || reaper.reap(&roots)).await {
            Ok(0) => debug!("No orphaned browser processes to clean up"),
            Ok(reaped) => self
                .observer
                .on_log(&format!("Cleaned up {reaped} orphaned browser processes"), false),
            Err(e) => warn!(error = %e, "Browser reaper task failed"),
        }

        let sweeper = Arc::clone(&self.profile_reaper);
        let profiles_dir = self.profiles_dir.clone();
        match tokio::task::spawn_blocking(move || sweeper.sweep(&profiles_dir)).await {
            Ok(0) => debug!("No leftover profile directories"),
            Ok(swept) => self
                .observer
                .on_log(&format!("Removed {swept} leftover profile directories"), false),
            Err(e) => warn!(error = %e, "Profile reaper task failed"),
        }
    }
}
