//! CLI command definitions for flotilla.
//!
//! Provides the `run` command, which dispatches a full automation run, and
//! the `clean` command, which invokes the cleanup reapers standalone.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::cleanup::{BrowserReaper, ProcessReaper, ProfileReaper, ProfileSweeper};
use crate::config::RunConfig;
use crate::dispatch::{Dispatcher, Mode};
use crate::observer::TracingObserver;
use crate::worker::ShellWorker;

/// Default per-unit timeout for the external automation process, in seconds.
const DEFAULT_UNIT_TIMEOUT_SECS: u64 = 600;

/// Process-pool dispatcher for fleets of browser automation workers.
#[derive(Parser)]
#[command(name = "flotilla")]
#[command(about = "Dispatch browser automation workers over shared input pools")]
#[command(version)]
#[command(
    long_about = "flotilla partitions proxy/data/account pools into work chunks and runs a bounded fleet of browser automation workers over them.\n\nExample usage:\n  flotilla run --mode 1 --processes 8 --worker ./automation"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Dispatch a run over the configured pools.
    Run(RunArgs),

    /// Kill orphaned browser processes and sweep leftover profiles.
    Clean(CleanArgs),
}

/// Arguments for `flotilla run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Operating mode (1-4).
    #[arg(short, long, default_value = "1")]
    pub mode: u8,

    /// Maximum number of concurrently live worker slots.
    #[arg(short = 'n', long, default_value = "4")]
    pub processes: usize,

    /// Show browser windows instead of running headless.
    #[arg(long)]
    pub headed: bool,

    /// External automation executable run once per unit of work.
    #[arg(short, long)]
    pub worker: PathBuf,

    /// Extra arguments prepended to every worker invocation.
    #[arg(long = "worker-arg")]
    pub worker_args: Vec<String>,

    /// Per-unit timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_UNIT_TIMEOUT_SECS)]
    pub unit_timeout: u64,

    /// Proxy pool file, one proxy per line.
    #[arg(long, default_value = "proxies.txt")]
    pub proxies: PathBuf,

    /// Data pool file, one item per line.
    #[arg(long, default_value = "data.txt")]
    pub data: PathBuf,

    /// Account pool file, one account per line.
    #[arg(long, default_value = "accounts.txt")]
    pub accounts: PathBuf,

    /// Directory for result files and the recovery sink.
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Directory for per-worker browser profiles.
    #[arg(long, default_value = "profiles")]
    pub profiles: PathBuf,
}

/// Arguments for `flotilla clean`.
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Directory for per-worker browser profiles.
    #[arg(long, default_value = "profiles")]
    pub profiles: PathBuf,

    /// Directory for result files and the recovery sink.
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the CLI with already-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_command(args).await,
        Commands::Clean(args) => clean_command(args).await,
    }
}

/// Parses arguments and runs the CLI.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

async fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let mode = Mode::from_index(args.mode)
        .with_context(|| format!("mode must be 1-4, got {}", args.mode))?;

    let config = RunConfig::new(mode)
        .with_process_limit(args.processes)
        .with_headless(!args.headed)
        .with_proxies_file(args.proxies)
        .with_data_file(args.data)
        .with_accounts_file(args.accounts)
        .with_output_dir(args.output)
        .with_profiles_dir(args.profiles);

    // Sweep leftovers from a previous run before spawning anything.
    sweep(config.profiles_dir.clone(), config.output_dir.clone()).await?;

    let worker = ShellWorker::new(args.worker)
        .with_args(args.worker_args)
        .with_data_file(config.data_file.clone())
        .with_output_dir(config.output_dir.clone())
        .with_profiles_dir(config.profiles_dir.clone())
        .with_unit_timeout(Duration::from_secs(args.unit_timeout));

    let mut dispatcher = Dispatcher::new(config, Arc::new(TracingObserver), Arc::new(worker));

    // Ctrl-C requests a cooperative stop; the dispatcher reclaims in-flight
    // work and finalizes before returning.
    let stop = dispatcher.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received; stopping run");
            stop.stop();
        }
    });

    let summary = dispatcher.run().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn clean_command(args: CleanArgs) -> anyhow::Result<()> {
    sweep(args.profiles, args.output).await?;
    info!("Cleanup complete");
    Ok(())
}

/// Invokes both reapers off the async control flow.
async fn sweep(profiles_dir: PathBuf, output_dir: PathBuf) -> anyhow::Result<()> {
    let (reaped, swept) = tokio::task::spawn_blocking(move || {
        let reaped = ProcessReaper::new().reap(&[profiles_dir.clone(), output_dir]);
        let swept = ProfileSweeper::new().sweep(&profiles_dir);
        (reaped, swept)
    })
    .await
    .context("cleanup task failed")?;

    if reaped > 0 || swept > 0 {
        info!(reaped, swept, "Swept leftovers from previous runs");
    }
    Ok(())
}
