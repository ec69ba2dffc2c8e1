//! Input pools and the durable files a run writes.
//!
//! Three plain-text pools feed a run: proxies, data items, and accounts, one
//! item per line, read once at partition time. During and after a run the
//! system appends to durable files: category result files written by workers
//! (success, failure, unresolved) and the recovery sink written by the
//! shutdown coordinator. None of these files are ever rewritten in place,
//! with one exception: consumed data lines are removed from the data pool
//! file so an interrupted run leaves the pool reflecting remaining work.
//!
//! The underlying storage has no atomic-append guarantee across concurrent
//! writers, so every write goes through one shared [`FileLock`] handed to all
//! workers and to the shutdown coordinator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

/// File name for successful work items inside the output directory.
const SUCCESS_FILE: &str = "success.txt";
/// File name for failed work items inside the output directory.
const FAILURE_FILE: &str = "failed.txt";
/// File name for items that could not be classified either way.
const UNRESOLVED_FILE: &str = "unresolved.txt";

/// Errors from pool and output-file operations.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The one process-wide lock serializing appends to shared files.
///
/// A single instance is created per run and cloned into every worker and the
/// shutdown coordinator; it is never implicit global state.
#[derive(Clone, Default)]
pub struct FileLock {
    inner: Arc<Mutex<()>>,
}

impl FileLock {
    /// Creates a new lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock, waiting if another writer holds it.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }
}

/// The three input pools, loaded once at run start.
#[derive(Debug, Clone, Default)]
pub struct PoolStore {
    /// Proxy addresses.
    pub proxies: Vec<String>,
    /// Data items.
    pub data: Vec<String>,
    /// Account items.
    pub accounts: Vec<String>,
}

impl PoolStore {
    /// Loads all three pools from line files.
    ///
    /// A missing file yields an empty pool with a warning; whether an empty
    /// pool is fatal is the partitioner's call, not the store's.
    pub async fn load(
        proxies_file: &Path,
        data_file: &Path,
        accounts_file: &Path,
    ) -> Result<Self, PoolError> {
        Ok(Self {
            proxies: load_lines(proxies_file, "proxies").await?,
            data: load_lines(data_file, "data").await?,
            accounts: load_lines(accounts_file, "accounts").await?,
        })
    }

    /// Builds a store from in-memory pools, e.g. items supplied by a
    /// control surface instead of files.
    pub fn from_parts(proxies: Vec<String>, data: Vec<String>, accounts: Vec<String>) -> Self {
        Self {
            proxies,
            data,
            accounts,
        }
    }
}

/// Reads a line file into trimmed, non-empty items.
async fn load_lines(path: &Path, what: &str) -> Result<Vec<String>, PoolError> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(file = %path.display(), pool = what, "Pool file not found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Appends `items` to `path`, one per line, creating the file and its parent
/// directory as needed. The caller must hold the shared lock.
async fn append_lines(path: &Path, items: &[String]) -> Result<(), PoolError> {
    if items.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    let mut buf = String::new();
    for item in items {
        buf.push_str(item.trim());
        buf.push('\n');
    }
    file.write_all(buf.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Append-only durable store for work reclaimed on forced shutdown.
///
/// Written only by the shutdown coordinator and never read back
/// automatically; an operator re-feeds it as input.
#[derive(Clone)]
pub struct RecoverySink {
    path: PathBuf,
    lock: FileLock,
}

impl RecoverySink {
    /// Creates a sink at `path` sharing the run's file lock.
    pub fn new(path: impl Into<PathBuf>, lock: FileLock) -> Self {
        Self {
            path: path.into(),
            lock,
        }
    }

    /// The sink's file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends reclaimed items, one per line.
    pub async fn append(&self, items: &[String]) -> Result<(), PoolError> {
        let _guard = self.lock.acquire().await;
        append_lines(&self.path, items).await
    }
}

/// Append-only category result files written by workers.
#[derive(Clone)]
pub struct OutputFiles {
    dir: PathBuf,
    lock: FileLock,
}

impl OutputFiles {
    /// Creates the category files surface under `dir`, sharing the run's
    /// file lock.
    pub fn new(dir: impl Into<PathBuf>, lock: FileLock) -> Self {
        Self {
            dir: dir.into(),
            lock,
        }
    }

    /// Records items whose unit of work succeeded.
    pub async fn append_success(&self, items: &[String]) -> Result<(), PoolError> {
        self.append(SUCCESS_FILE, items).await
    }

    /// Records items whose unit of work failed.
    pub async fn append_failure(&self, items: &[String]) -> Result<(), PoolError> {
        self.append(FAILURE_FILE, items).await
    }

    /// Records items that could not be classified either way.
    pub async fn append_unresolved(&self, items: &[String]) -> Result<(), PoolError> {
        self.append(UNRESOLVED_FILE, items).await
    }

    async fn append(&self, name: &str, items: &[String]) -> Result<(), PoolError> {
        let _guard = self.lock.acquire().await;
        append_lines(&self.dir.join(name), items).await
    }
}

/// Removes consumed items from a pool file, rewriting it without them.
///
/// Returns the number of lines remaining. A missing pool file is a no-op.
pub async fn remove_processed(
    path: &Path,
    consumed: &[String],
    lock: &FileLock,
) -> Result<usize, PoolError> {
    let _guard = lock.acquire().await;

    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let consumed: std::collections::HashSet<&str> =
        consumed.iter().map(|item| item.trim()).collect();

    let remaining: Vec<&str> = contents
        .lines()
        .filter(|line| !consumed.contains(line.trim()))
        .collect();
    let count = remaining.len();

    let mut out = remaining.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    fs::write(path, out).await?;
    Ok(count)
}
