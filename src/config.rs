//! Run configuration for the dispatcher.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::Mode;

/// Default concurrency ceiling.
const DEFAULT_PROCESS_LIMIT: usize = 4;
/// Interval of the dispatcher's polling waits.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long the shutdown coordinator waits before force-killing a slot.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("process limit must be at least 1")]
    ZeroProcessLimit,

    #[error("poll interval must be non-zero")]
    ZeroPollInterval,
}

/// Configuration for one dispatch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Operating mode, fixed for the run.
    pub mode: Mode,
    /// Maximum number of concurrently live worker slots.
    pub process_limit: usize,
    /// Whether workers run their browsers headless.
    pub headless: bool,
    /// Interval of the spawn-loop and drain-loop waits.
    pub poll_interval: Duration,
    /// Graceful-join timeout before slots are force-killed.
    pub shutdown_timeout: Duration,
    /// Proxy pool file, one proxy per line.
    pub proxies_file: PathBuf,
    /// Data pool file, one item per line.
    pub data_file: PathBuf,
    /// Account pool file, one account per line.
    pub accounts_file: PathBuf,
    /// Directory for category result files and the recovery sink.
    pub output_dir: PathBuf,
    /// Directory holding per-worker browser profile directories.
    pub profiles_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: Mode::SubmitPrimary,
            process_limit: DEFAULT_PROCESS_LIMIT,
            headless: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            proxies_file: PathBuf::from("proxies.txt"),
            data_file: PathBuf::from("data.txt"),
            accounts_file: PathBuf::from("accounts.txt"),
            output_dir: PathBuf::from("output"),
            profiles_dir: PathBuf::from("profiles"),
        }
    }
}

impl RunConfig {
    /// Creates a configuration for `mode` with defaults for everything else.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Sets the concurrency ceiling.
    pub fn with_process_limit(mut self, limit: usize) -> Self {
        self.process_limit = limit;
        self
    }

    /// Sets the headless flag.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Sets the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the graceful-shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the proxy pool file.
    pub fn with_proxies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.proxies_file = path.into();
        self
    }

    /// Sets the data pool file.
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    /// Sets the account pool file.
    pub fn with_accounts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.accounts_file = path.into();
        self
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the profiles directory.
    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = dir.into();
        self
    }

    /// Path of the recovery sink file inside the output directory.
    pub fn recovery_file(&self) -> PathBuf {
        self.output_dir.join("recovered.txt")
    }

    /// Validates the configuration before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.process_limit == 0 {
            return Err(ConfigError::ZeroProcessLimit);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}
