//! The process-pool dispatcher: the scheduling core of a run.
//!
//! A run moves through three phases. **Filling**: the pools are partitioned
//! and every chunk is pushed into the shared queues. **Running**: the spawn
//! loop starts one worker slot per chunk, never exceeding the effective
//! concurrency limit, reaping finished slots while it waits for capacity.
//! **Draining**: no more chunks to claim (or a stop was requested); the
//! dispatcher keeps folding results until every slot is done, then the
//! shutdown coordinator finalizes the run.
//!
//! The dispatcher is a single polling control flow. It never blocks
//! indefinitely: every wait is a short sleep paired with non-blocking checks
//! (slot reap, result drain, stop flag), so a stop request becomes visible
//! within one poll interval.
//!
//! A crashed worker slot does not abort the dispatcher; the slot is reaped
//! as not-alive and its missing result is the only trace. Its chunk is not
//! retried — reclaim happens only through the shutdown coordinator during an
//! explicit stop, so a chunk lost to a crash during normal operation stays
//! lost (a known gap, kept from the source behavior).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cleanup::{BrowserReaper, ProcessReaper, ProfileReaper, ProfileSweeper};
use crate::config::{ConfigError, RunConfig};
use crate::observer::Observer;
use crate::pools::{FileLock, PoolError, PoolStore, RecoverySink};
use crate::worker::{SlotContext, SlotWorker};

use super::partition::{Mode, PartitionError, PartitionPlan};
use super::progress::{Progress, RunCounters};
use super::queue::{SlotEvent, WorkQueues};
use super::shutdown::ShutdownCoordinator;

/// Errors that prevent a run from proceeding.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A pool the selected mode requires is empty.
    #[error(transparent)]
    Partition(#[from] PartitionError),

    /// Loading the input pools failed.
    #[error("Failed to load pools: {0}")]
    Pool(#[from] PoolError),
}

/// Cloneable handle for requesting a cooperative stop of a running dispatch.
///
/// The flag is checked at every iteration of the spawn loop's capacity wait
/// and of the final drain loop; the run then finalizes through the shutdown
/// coordinator.
#[derive(Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Requests a stop. Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the dispatcher still considers itself running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// A spawned worker slot and its join handle.
pub(crate) struct SlotHandle {
    pub(crate) slot: usize,
    pub(crate) handle: JoinHandle<()>,
}

/// Arena mapping slot index to the data chunk it was given.
///
/// Written at spawn time (data-centric modes only), cleared when the slot is
/// confirmed finished, consulted only by the shutdown coordinator. This is
/// the only record of what an in-flight slot was working on when it must be
/// killed.
#[derive(Debug, Default)]
pub(crate) struct SlotAssignments {
    entries: Vec<Option<Vec<String>>>,
}

impl SlotAssignments {
    pub(crate) fn new(slot_count: usize) -> Self {
        Self {
            entries: (0..slot_count).map(|_| None).collect(),
        }
    }

    pub(crate) fn record(&mut self, slot: usize, chunk: Vec<String>) {
        if let Some(entry) = self.entries.get_mut(slot) {
            *entry = Some(chunk);
        }
    }

    pub(crate) fn clear(&mut self, slot: usize) {
        if let Some(entry) = self.entries.get_mut(slot) {
            *entry = None;
        }
    }

    pub(crate) fn take(&mut self, slot: usize) -> Option<Vec<String>> {
        self.entries.get_mut(slot).and_then(Option::take)
    }

    pub(crate) fn clear_all(&mut self) {
        self.entries.clear();
    }
}

/// Final accounting for a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// The mode the run operated in.
    pub mode: Mode,
    /// Size of the authoritative pool.
    pub total: u64,
    /// Items with a drained result.
    pub processed: u64,
    /// Items whose unit succeeded.
    pub succeeded: u64,
    /// Items whose unit failed.
    pub failed: u64,
    /// Whether the run ended by stop request rather than pool exhaustion.
    pub stopped: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

/// The process-pool dispatcher and lifecycle manager.
pub struct Dispatcher {
    config: RunConfig,
    observer: Arc<dyn Observer>,
    worker: Arc<dyn SlotWorker>,
    browser_reaper: Arc<dyn BrowserReaper>,
    profile_reaper: Arc<dyn ProfileReaper>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    queues: WorkQueues,
    counters: RunCounters,
    slots: Vec<SlotHandle>,
    assignments: SlotAssignments,
    lock: FileLock,
    sink: RecoverySink,
}

impl Dispatcher {
    /// Creates a dispatcher with the default reapers.
    pub fn new(
        config: RunConfig,
        observer: Arc<dyn Observer>,
        worker: Arc<dyn SlotWorker>,
    ) -> Self {
        let lock = FileLock::new();
        let sink = RecoverySink::new(config.recovery_file(), lock.clone());
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            observer,
            worker,
            browser_reaper: Arc::new(ProcessReaper::new()),
            profile_reaper: Arc::new(ProfileSweeper::new()),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            queues: WorkQueues::new(),
            counters: RunCounters::default(),
            slots: Vec::new(),
            assignments: SlotAssignments::default(),
            lock,
            sink,
        }
    }

    /// Replaces the cleanup collaborators.
    pub fn with_reapers(
        mut self,
        browser_reaper: Arc<dyn BrowserReaper>,
        profile_reaper: Arc<dyn ProfileReaper>,
    ) -> Self {
        self.browser_reaper = browser_reaper;
        self.profile_reaper = profile_reaper;
        self
    }

    /// The shared lock serializing appends to run files, for callers that
    /// build collaborators writing alongside the workers.
    pub fn file_lock(&self) -> FileLock {
        self.lock.clone()
    }

    /// Handle for requesting a stop from another task or thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Loads the pools from the configured files and dispatches a run.
    pub async fn run(&mut self) -> Result<RunSummary, DispatchError> {
        self.config.validate()?;
        let pools = PoolStore::load(
            &self.config.proxies_file,
            &self.config.data_file,
            &self.config.accounts_file,
        )
        .await?;
        self.run_with_pools(pools).await
    }

    /// Dispatches a run over already-loaded pools.
    ///
    /// Returns once every slot has finished (or been killed) and the
    /// shutdown coordinator has completed.
    pub async fn run_with_pools(
        &mut self,
        pools: PoolStore,
    ) -> Result<RunSummary, DispatchError> {
        self.config.validate()?;
        let started_at = Utc::now();
        self.running.store(true, Ordering::SeqCst);

        // Filling: partition the pools and populate fresh per-run queues.
        let plan = match PartitionPlan::build(
            self.config.mode,
            self.config.process_limit,
            pools.proxies,
            pools.data,
            pools.accounts,
        ) {
            Ok(plan) => plan,
            Err(e) => {
                // Fatal precondition: refuse to start, spawn nothing.
                self.observer.on_log(&e.to_string(), true);
                self.observer.on_finished();
                self.running.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        self.queues = WorkQueues::new();
        self.counters = RunCounters::new(plan.total);
        self.assignments = SlotAssignments::new(plan.slot_count);
        plan.fill_queues(&self.queues);

        info!(
            mode = %plan.mode,
            slots = plan.slot_count,
            limit = plan.effective_limit,
            total = plan.total,
            "Dispatch run starting"
        );
        self.observer
            .on_log(&format!("Total worker slots to run: {}", plan.slot_count), false);
        self.observer.on_progress(self.counters.snapshot());

        let data_centric = self.config.mode.is_data_centric();

        // Running: the spawn loop.
        for slot in 0..plan.slot_count {
            if !self.is_running() {
                self.observer
                    .on_log("Stop requested; no further slots will be spawned", false);
                break;
            }

            // The concurrency-limit wait is the only scheduling point;
            // finished slots are reaped here and the stop flag is checked on
            // every iteration.
            while self.live_count() >= plan.effective_limit && self.is_running() {
                self.reap_finished().await;
                tokio::time::sleep(self.config.poll_interval).await;
            }
            if !self.is_running() {
                break;
            }

            let chunk = if data_centric {
                match self.queues.data.try_pop() {
                    Some(chunk) => chunk,
                    // Data exhausted: no more slots to spawn.
                    None => break,
                }
            } else {
                Vec::new()
            };

            if data_centric {
                self.assignments.record(slot, chunk.clone());
            }
            self.spawn_slot(slot, chunk);

            // Make progress visible without waiting for the whole batch.
            self.drain_results();
        }

        // Draining: wait out the live slots, folding results as they land.
        if self.is_running() {
            while (self.any_alive() || !self.queues.results.is_empty()) && self.is_running() {
                self.drain_results();
                tokio::time::sleep(self.config.poll_interval).await;
                self.reap_finished().await;
            }
        }

        let stopped = !self.is_running();
        self.shutdown().await;
        // Results that landed between the last drain and shutdown.
        self.drain_results();

        let progress = self.counters.snapshot();
        self.observer.on_log(
            &format!(
                "All slots completed. Processed {}/{} items. Success: {}, Failed: {}",
                progress.processed, progress.total, progress.succeeded, progress.failed
            ),
            false,
        );
        self.observer.on_finished();

        Ok(RunSummary {
            mode: self.config.mode,
            total: progress.total,
            processed: progress.processed,
            succeeded: progress.succeeded,
            failed: progress.failed,
            stopped,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Runs the shutdown coordinator: reclaim, terminate, clean up.
    ///
    /// Safe to call again after a run; a second invocation finds nothing
    /// live and writes no duplicate reclaim entries.
    pub async fn shutdown(&mut self) {
        let coordinator = ShutdownCoordinator {
            observer: Arc::clone(&self.observer),
            sink: self.sink.clone(),
            browser_reaper: Arc::clone(&self.browser_reaper),
            profile_reaper: Arc::clone(&self.profile_reaper),
            shutdown_timeout: self.config.shutdown_timeout,
            profiles_dir: self.config.profiles_dir.clone(),
            scan_roots: vec![
                self.config.profiles_dir.clone(),
                self.config.output_dir.clone(),
            ],
            data_centric: self.config.mode.is_data_centric(),
        };

        coordinator
            .run(
                &self.running,
                &self.shutdown_tx,
                &mut self.slots,
                &mut self.assignments,
            )
            .await;
    }

    /// Spawns one worker slot bound to its chunk and the shared handles.
    fn spawn_slot(&mut self, slot: usize, chunk: Vec<String>) {
        let ctx = SlotContext {
            slot,
            data_chunk: chunk,
            queues: self.queues.clone(),
            headless: self.config.headless,
            mode: self.config.mode,
            lock: self.lock.clone(),
            stop: self.shutdown_tx.subscribe(),
        };

        let worker = Arc::clone(&self.worker);
        let handle = tokio::spawn(async move { worker.run_slot(ctx).await });

        debug!(slot, "Spawned worker slot");
        self.slots.push(SlotHandle { slot, handle });
    }

    /// Result aggregator: non-blocking drain of everything currently in the
    /// result queue. Idempotent; a no-op on an empty queue.
    fn drain_results(&mut self) {
        while let Some(SlotEvent::Completed { payload, success }) = self.queues.results.try_pop()
        {
            self.counters.record(payload.count(), success);
            self.observer.on_progress(self.counters.snapshot());
            self.observer
                .on_log(&format!("Completed: {payload} (success={success})"), false);
        }
    }

    /// Joins finished slots, drops them from the live set, and clears their
    /// assignments. A panicked slot is logged and treated like a crashed
    /// process: no result, no retry.
    async fn reap_finished(&mut self) {
        let mut live = Vec::with_capacity(self.slots.len());
        for slot_handle in self.slots.drain(..) {
            if !slot_handle.handle.is_finished() {
                live.push(slot_handle);
                continue;
            }
            if let Err(e) = slot_handle.handle.await {
                if e.is_panic() {
                    error!(slot = slot_handle.slot, "Worker slot panicked");
                }
            }
            self.assignments.clear(slot_handle.slot);
        }
        self.slots = live;
    }

    fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot_handle| !slot_handle.handle.is_finished())
            .count()
    }

    fn any_alive(&self) -> bool {
        self.slots
            .iter()
            .any(|slot_handle| !slot_handle.handle.is_finished())
    }

    /// Counters snapshot for external progress queries.
    pub fn progress(&self) -> Progress {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::queue::ResultPayload;
    use crate::observer::test_support::RecordingObserver;
    use async_trait::async_trait;
    use std::path::Path;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct NoReap;

    impl BrowserReaper for NoReap {
        fn reap(&self, _roots: &[PathBuf]) -> usize {
            0
        }
    }

    impl ProfileReaper for NoReap {
        fn sweep(&self, _profiles_dir: &Path) -> usize {
            0
        }
    }

    /// Worker that sleeps, then reports its whole chunk as one success.
    struct CountingWorker {
        delay: Duration,
        invocations: Arc<AtomicUsize>,
        concurrent: Arc<AtomicUsize>,
        max_concurrent: Arc<AtomicUsize>,
    }

    impl CountingWorker {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                invocations: Arc::default(),
                concurrent: Arc::default(),
                max_concurrent: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl SlotWorker for CountingWorker {
        async fn run_slot(&self, ctx: SlotContext) {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent.fetch_max(now, Ordering::SeqCst);

            let covered = if ctx.mode.is_data_centric() {
                ctx.data_chunk.clone()
            } else {
                ctx.queues.accounts.try_pop().unwrap_or_default()
            };

            tokio::time::sleep(self.delay).await;

            ctx.queues.results.push(SlotEvent::Completed {
                payload: ResultPayload::Batch(covered),
                success: true,
            });
            self.concurrent.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Worker that never finishes on its own.
    struct StuckWorker;

    #[async_trait]
    impl SlotWorker for StuckWorker {
        async fn run_slot(&self, _ctx: SlotContext) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }

    fn test_config(dir: &Path, mode: Mode, limit: usize) -> RunConfig {
        RunConfig::new(mode)
            .with_process_limit(limit)
            .with_poll_interval(Duration::from_millis(10))
            .with_shutdown_timeout(Duration::from_millis(200))
            .with_output_dir(dir.join("output"))
            .with_profiles_dir(dir.join("profiles"))
    }

    fn dispatcher_with(
        config: RunConfig,
        worker: Arc<dyn SlotWorker>,
    ) -> (Dispatcher, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let dispatcher = Dispatcher::new(config, observer.clone(), worker)
            .with_reapers(Arc::new(NoReap), Arc::new(NoReap));
        (dispatcher, observer)
    }

    fn items(n: usize, prefix: &str) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[tokio::test]
    async fn test_data_centric_run_processes_every_item() {
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(CountingWorker::new(Duration::from_millis(20)));
        let config = test_config(dir.path(), Mode::SubmitPrimary, 5);
        let (mut dispatcher, observer) = dispatcher_with(config, worker.clone());

        let pools = PoolStore::from_parts(items(2, "p"), items(65, "d"), items(10, "a"));
        let summary = dispatcher.run_with_pools(pools).await.unwrap();

        // 65 items in chunks of 30 -> 3 slots, all completed.
        assert_eq!(worker.invocations.load(Ordering::SeqCst), 3);
        assert_eq!(summary.total, 65);
        assert_eq!(summary.processed, 65);
        assert_eq!(summary.succeeded, 65);
        assert_eq!(summary.failed, 0);
        assert!(!summary.stopped);

        assert_eq!(*observer.finished.lock(), 1);
        let last = observer.last_progress().unwrap();
        assert_eq!(last.processed, last.succeeded + last.failed);
    }

    #[tokio::test]
    async fn test_account_centric_run() {
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(CountingWorker::new(Duration::from_millis(10)));
        let config = test_config(dir.path(), Mode::AuditPrimary, 2);
        let (mut dispatcher, _observer) = dispatcher_with(config, worker.clone());

        let pools = PoolStore::from_parts(Vec::new(), Vec::new(), items(7, "a"));
        let summary = dispatcher.run_with_pools(pools).await.unwrap();

        // 7 accounts in chunks of 3 -> 3 slots.
        assert_eq!(worker.invocations.load(Ordering::SeqCst), 3);
        assert_eq!(summary.total, 7);
        assert_eq!(summary.processed, 7);
        assert_eq!(summary.succeeded, 7);
    }

    #[tokio::test]
    async fn test_live_slots_never_exceed_limit() {
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(CountingWorker::new(Duration::from_millis(40)));
        let config = test_config(dir.path(), Mode::SubmitPrimary, 2);
        let (mut dispatcher, _observer) = dispatcher_with(config, worker.clone());

        // 180 items -> 6 chunks of 30, squeezed through 2 slots at a time.
        let pools = PoolStore::from_parts(Vec::new(), items(180, "d"), items(10, "a"));
        let summary = dispatcher.run_with_pools(pools).await.unwrap();

        assert_eq!(worker.invocations.load(Ordering::SeqCst), 6);
        assert!(worker.max_concurrent.load(Ordering::SeqCst) <= 2);
        assert_eq!(summary.processed, 180);
    }

    #[tokio::test]
    async fn test_scenario_b_empty_account_pool_refuses_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(CountingWorker::new(Duration::ZERO));
        let config = test_config(dir.path(), Mode::AuditPrimary, 4);
        let (mut dispatcher, observer) = dispatcher_with(config, worker.clone());

        let pools = PoolStore::from_parts(items(3, "p"), Vec::new(), Vec::new());
        let err = dispatcher.run_with_pools(pools).await.unwrap_err();

        assert!(matches!(err, DispatchError::Partition(_)));
        assert_eq!(worker.invocations.load(Ordering::SeqCst), 0);
        assert_eq!(observer.error_logs().len(), 1);
        assert_eq!(*observer.finished.lock(), 1);
    }

    #[tokio::test]
    async fn test_scenario_c_stop_reclaims_in_flight_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), Mode::SubmitPrimary, 3);
        let recovery = config.recovery_file();
        let (mut dispatcher, _observer) = dispatcher_with(config, Arc::new(StuckWorker));
        let stop = dispatcher.stop_handle();

        // 150 items -> 5 chunks; slots 0-2 fill the limit and never finish,
        // so the spawn loop parks in its capacity wait until the stop.
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            stop.stop();
        });

        let pools = PoolStore::from_parts(Vec::new(), items(150, "d"), items(10, "a"));
        let summary = dispatcher.run_with_pools(pools).await.unwrap();

        assert!(summary.stopped);
        assert_eq!(summary.processed, 0);

        // Slots 0-2 were spawned and reclaimed line-for-line; slots 3 and 4
        // never existed.
        let reclaimed = std::fs::read_to_string(&recovery).unwrap();
        let lines: Vec<&str> = reclaimed.lines().collect();
        let expected: Vec<String> = items(90, "d");
        assert_eq!(lines, expected.iter().map(String::as_str).collect::<Vec<_>>());

        // A second shutdown writes no duplicate reclaim entries.
        dispatcher.shutdown().await;
        let after = std::fs::read_to_string(&recovery).unwrap();
        assert_eq!(after, reclaimed);
    }

    #[tokio::test]
    async fn test_shutdown_without_run_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), Mode::SubmitPrimary, 2);
        let recovery = config.recovery_file();
        let (mut dispatcher, _observer) =
            dispatcher_with(config, Arc::new(CountingWorker::new(Duration::ZERO)));

        dispatcher.shutdown().await;
        dispatcher.shutdown().await;

        assert!(!recovery.exists());
    }

    #[tokio::test]
    async fn test_results_drained_in_any_arrival_order() {
        // Scenario D at the dispatcher level: a worker that reports batches
        // out of spawn order still yields exact counters.
        struct ReverseWorker;

        #[async_trait]
        impl SlotWorker for ReverseWorker {
            async fn run_slot(&self, ctx: SlotContext) {
                // Later slots report sooner.
                let delay = Duration::from_millis(60_u64.saturating_sub(ctx.slot as u64 * 20));
                tokio::time::sleep(delay).await;
                ctx.queues.results.push(SlotEvent::Completed {
                    payload: ResultPayload::Batch(ctx.data_chunk.clone()),
                    success: true,
                });
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), Mode::SubmitPrimary, 3);
        let (mut dispatcher, _observer) = dispatcher_with(config, Arc::new(ReverseWorker));

        let pools = PoolStore::from_parts(Vec::new(), items(65, "d"), items(10, "a"));
        let summary = dispatcher.run_with_pools(pools).await.unwrap();

        assert_eq!(summary.processed, 65);
        assert_eq!(summary.succeeded, 65);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_worker_panic_does_not_abort_run() {
        struct PanickyWorker {
            invocations: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl SlotWorker for PanickyWorker {
            async fn run_slot(&self, ctx: SlotContext) {
                self.invocations.fetch_add(1, Ordering::SeqCst);
                if ctx.slot == 0 {
                    panic!("worker crashed");
                }
                ctx.queues.results.push(SlotEvent::Completed {
                    payload: ResultPayload::Batch(ctx.data_chunk.clone()),
                    success: true,
                });
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let invocations = Arc::new(AtomicUsize::new(0));
        let worker = Arc::new(PanickyWorker {
            invocations: invocations.clone(),
        });
        let config = test_config(dir.path(), Mode::SubmitPrimary, 1);
        let (mut dispatcher, _observer) = dispatcher_with(config, worker);

        // 3 chunks; the first slot crashes, the other two complete.
        let pools = PoolStore::from_parts(Vec::new(), items(65, "d"), items(10, "a"));
        let summary = dispatcher.run_with_pools(pools).await.unwrap();

        assert_eq!(invocations.load(Ordering::SeqCst), 3);
        // The crashed slot's 30 items produced no result and no retry.
        assert_eq!(summary.processed, 35);
        assert_eq!(summary.succeeded, 35);
    }
}
