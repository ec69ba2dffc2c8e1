//! Worker entry contract and the external-process worker.
//!
//! A worker slot receives its spawn parameters, performs the mode-specific
//! work, and pushes exactly one result event per completed unit of work onto
//! the result queue before returning. On an unrecoverable error it still
//! pushes a failed event rather than crash silently.
//!
//! The automation logic itself lives outside this crate. [`ShellWorker`]
//! bridges to it by running one external automation process per unit of
//! work, each with its own browser profile directory, so every unit owns its
//! heavyweight browser engine exclusively for its lifetime.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatch::{chunk_items, Mode, ResultPayload, SiteVariant, SlotEvent, WorkQueues};
use crate::pools::{remove_processed, FileLock, OutputFiles};

/// Sub-batch size a data-centric slot feeds to one unit of work.
const UNIT_DATA_BATCH: usize = 3;

/// Columns of the on-screen window grid for non-headless workers.
const WINDOW_GRID_COLS: usize = 6;
/// Rows of the on-screen window grid.
const WINDOW_GRID_ROWS: usize = 2;
/// Pixel pitch of one grid cell.
const WINDOW_GRID_STEP: usize = 500;

/// Everything a worker slot is handed at spawn time.
pub struct SlotContext {
    /// Slot index assigned by the dispatcher for this slot's lifetime.
    pub slot: usize,
    /// The data chunk assigned to this slot; empty in account-centric modes.
    pub data_chunk: Vec<String>,
    /// Handles to the four shared queues.
    pub queues: WorkQueues,
    /// Whether to run the browser headless.
    pub headless: bool,
    /// The run's operating mode.
    pub mode: Mode,
    /// The process-wide lock serializing shared-file writes.
    pub lock: FileLock,
    /// Receiver of the graceful-stop broadcast.
    pub stop: broadcast::Receiver<()>,
}

impl SlotContext {
    /// Top-left corner for this slot's browser window when not headless.
    ///
    /// Slots tile a fixed grid so side-by-side runs stay visible.
    pub fn window_origin(&self) -> (usize, usize) {
        let col = self.slot % WINDOW_GRID_COLS;
        let row = (self.slot / WINDOW_GRID_COLS) % WINDOW_GRID_ROWS;
        (col * WINDOW_GRID_STEP, row * WINDOW_GRID_STEP)
    }

    /// Whether the graceful-stop broadcast has fired.
    pub fn stop_requested(&mut self) -> bool {
        use broadcast::error::TryRecvError;
        !matches!(self.stop.try_recv(), Err(TryRecvError::Empty))
    }
}

/// The worker entry contract implemented by automation collaborators.
#[async_trait]
pub trait SlotWorker: Send + Sync + 'static {
    /// Runs one slot to completion.
    async fn run_slot(&self, ctx: SlotContext);
}

/// How one unit of external work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitOutcome {
    Success,
    Failure,
    /// The unit could not be classified either way (bad exit, timeout,
    /// spawn failure). Counted as failed, recorded separately on disk.
    Unresolved,
}

/// Input handed to the external automation process on stdin.
#[derive(Debug, Serialize)]
struct UnitInput<'a> {
    accounts: &'a [String],
    items: &'a [String],
    site: SiteVariant,
    proxy: &'a str,
}

/// Worker that delegates each unit of work to an external automation
/// executable, one OS process per unit.
///
/// Protocol: the unit's accounts, items, site variant, and proxy are written
/// to the child's stdin as JSON; exit code 0 means success, 1 means failure,
/// anything else (or a timeout) is unresolved.
#[derive(Clone)]
pub struct ShellWorker {
    program: PathBuf,
    args: Vec<String>,
    data_file: PathBuf,
    output_dir: PathBuf,
    profiles_dir: PathBuf,
    unit_timeout: Duration,
}

impl ShellWorker {
    /// Creates a worker running `program` for each unit of work.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            data_file: PathBuf::from("data.txt"),
            output_dir: PathBuf::from("output"),
            profiles_dir: PathBuf::from("profiles"),
            unit_timeout: Duration::from_secs(600),
        }
    }

    /// Fixed arguments prepended to every invocation.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Sets the data pool file consumed lines are removed from.
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    /// Sets the directory for category result files.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the directory per-unit profile directories are created under.
    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = dir.into();
        self
    }

    /// Sets the per-unit execution timeout.
    pub fn with_unit_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout = timeout;
        self
    }

    /// Runs one unit of external work and classifies its outcome.
    async fn run_unit(
        &self,
        ctx: &SlotContext,
        accounts: &[String],
        items: &[String],
        proxy: &str,
    ) -> UnitOutcome {
        let profile_dir = self
            .profiles_dir
            .join(format!("profile_{}", Uuid::new_v4()));
        if let Err(e) = tokio::fs::create_dir_all(&profile_dir).await {
            warn!(slot = ctx.slot, error = %e, "Failed to create profile directory");
            return UnitOutcome::Unresolved;
        }

        let outcome = self
            .spawn_and_wait(ctx, accounts, items, proxy, &profile_dir)
            .await;

        // The profile directory is owned by this unit alone; leftovers are
        // swept by the profile reaper at shutdown.
        if let Err(e) = tokio::fs::remove_dir_all(&profile_dir).await {
            debug!(slot = ctx.slot, error = %e, "Profile directory not removed");
        }

        outcome
    }

    async fn spawn_and_wait(
        &self,
        ctx: &SlotContext,
        accounts: &[String],
        items: &[String],
        proxy: &str,
        profile_dir: &Path,
    ) -> UnitOutcome {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--mode")
            .arg(ctx.mode.index().to_string())
            .arg("--slot")
            .arg(ctx.slot.to_string())
            .arg("--profile")
            .arg(profile_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if !proxy.is_empty() {
            cmd.arg("--proxy").arg(proxy);
        }
        if ctx.headless {
            cmd.arg("--headless");
        } else {
            let (x, y) = ctx.window_origin();
            cmd.env("FLOTILLA_WINDOW_X", x.to_string())
                .env("FLOTILLA_WINDOW_Y", y.to_string());
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(slot = ctx.slot, program = %self.program.display(), error = %e,
                    "Failed to spawn automation process");
                return UnitOutcome::Unresolved;
            }
        };

        let input = UnitInput {
            accounts,
            items,
            site: ctx.mode.profile().site,
            proxy,
        };
        if let Some(mut stdin) = child.stdin.take() {
            // The child may exit without reading stdin; a broken pipe here
            // is not an outcome of the unit.
            if let Ok(payload) = serde_json::to_vec(&input) {
                let _ = stdin.write_all(&payload).await;
            }
            drop(stdin);
        }

        match tokio::time::timeout(self.unit_timeout, child.wait()).await {
            Ok(Ok(status)) => match status.code() {
                Some(0) => UnitOutcome::Success,
                Some(1) => UnitOutcome::Failure,
                code => {
                    debug!(slot = ctx.slot, ?code, "Unclassified automation exit");
                    UnitOutcome::Unresolved
                }
            },
            Ok(Err(e)) => {
                warn!(slot = ctx.slot, error = %e, "Failed to wait on automation process");
                UnitOutcome::Unresolved
            }
            Err(_) => {
                warn!(slot = ctx.slot, timeout = ?self.unit_timeout, "Unit timed out; killing");
                let _ = child.kill().await;
                UnitOutcome::Unresolved
            }
        }
    }

    /// Records the unit on disk and pushes its result event.
    async fn report_unit(
        &self,
        ctx: &SlotContext,
        covered: Vec<String>,
        outcome: UnitOutcome,
    ) {
        let files = OutputFiles::new(&self.output_dir, ctx.lock.clone());
        let write = match outcome {
            UnitOutcome::Success => files.append_success(&covered).await,
            UnitOutcome::Failure => files.append_failure(&covered).await,
            UnitOutcome::Unresolved => files.append_unresolved(&covered).await,
        };
        if let Err(e) = write {
            warn!(slot = ctx.slot, error = %e, "Failed to record unit outcome");
        }

        ctx.queues.results.push(SlotEvent::Completed {
            payload: ResultPayload::Batch(covered),
            success: outcome == UnitOutcome::Success,
        });
    }
}

#[async_trait]
impl SlotWorker for ShellWorker {
    async fn run_slot(&self, mut ctx: SlotContext) {
        info!(slot = ctx.slot, mode = %ctx.mode, "Worker slot started");

        let account_chunk = ctx.queues.accounts.try_pop().unwrap_or_default();
        let proxy = ctx.queues.proxies.try_pop().unwrap_or_default();

        if ctx.mode.is_data_centric() {
            if account_chunk.is_empty() {
                info!(slot = ctx.slot, "No accounts available for slot");
                return;
            }

            // Each account carries one sub-batch of the slot's data chunk;
            // accounts beyond the available sub-batches idle this round.
            let batches = chunk_items(&ctx.data_chunk, UNIT_DATA_BATCH);
            for (account, batch) in account_chunk.iter().zip(batches) {
                if ctx.stop_requested() {
                    info!(slot = ctx.slot, "Stop requested; slot exits between units");
                    break;
                }

                let accounts = std::slice::from_ref(account);
                let outcome = self.run_unit(&ctx, accounts, &batch, &proxy).await;

                match remove_processed(&self.data_file, &batch, &ctx.lock).await {
                    Ok(remaining) => {
                        debug!(slot = ctx.slot, remaining, "Removed consumed data lines")
                    }
                    Err(e) => warn!(slot = ctx.slot, error = %e, "Failed to prune data pool"),
                }

                self.report_unit(&ctx, batch, outcome).await;
            }

            // Recycle the vehicles; the data chunk is consumed for good.
            if !proxy.is_empty() {
                ctx.queues.proxies.push(proxy);
            }
            ctx.queues.accounts.push(account_chunk);
        } else {
            if account_chunk.is_empty() {
                info!(slot = ctx.slot, "Account queue drained; slot exits");
                if !proxy.is_empty() {
                    ctx.queues.proxies.push(proxy);
                }
                return;
            }

            let outcome = self.run_unit(&ctx, &account_chunk, &[], &proxy).await;
            self.report_unit(&ctx, account_chunk, outcome).await;

            if !proxy.is_empty() {
                ctx.queues.proxies.push(proxy);
            }
        }

        info!(slot = ctx.slot, "Worker slot finished");
    }
}
