//! Cleanup collaborators invoked by the shutdown coordinator.
//!
//! Worker slots normally tear down their own browser processes and profile
//! directories, but a killed slot leaves both behind. The reapers sweep what
//! is left: browser or driver processes whose command line references this
//! run's working directories, and leftover per-worker profile directories.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sysinfo::{Pid, Signal, System};
use tracing::{debug, info, warn};

/// Process names treated as browser engines or drivers.
const BROWSER_PROCESS_NAMES: &[&str] = &["chrome", "chromium", "chromedriver"];

/// How long terminated processes get to exit before being killed.
const KILL_WAIT: Duration = Duration::from_secs(10);

/// Kills orphaned browser-engine and driver processes.
pub trait BrowserReaper: Send + Sync {
    /// Terminates every matching process whose command line references one
    /// of `roots`. Returns the number of processes reaped.
    fn reap(&self, roots: &[PathBuf]) -> usize;
}

/// Deletes leftover per-worker profile directories.
pub trait ProfileReaper: Send + Sync {
    /// Removes `profile_*` directories under `profiles_dir`. Returns the
    /// number of directories removed.
    fn sweep(&self, profiles_dir: &Path) -> usize;
}

/// Whether a process belongs to this run's browser fleet.
///
/// A process matches when its name contains one of the browser names and any
/// command-line argument references one of the run's working directories.
fn is_fleet_process(name: &str, cmd: &[String], names: &[String], roots: &[PathBuf]) -> bool {
    let name = name.to_lowercase();
    if !names.iter().any(|n| name.contains(n.as_str())) {
        return false;
    }
    cmd.iter().any(|arg| {
        roots
            .iter()
            .any(|root| arg.contains(&root.display().to_string()))
    })
}

/// System-wide browser reaper: terminate, wait bounded, then kill.
pub struct ProcessReaper {
    process_names: Vec<String>,
    kill_wait: Duration,
}

impl Default for ProcessReaper {
    fn default() -> Self {
        Self {
            process_names: BROWSER_PROCESS_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            kill_wait: KILL_WAIT,
        }
    }
}

impl ProcessReaper {
    /// Creates a reaper with the default browser process names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the process names to match.
    pub fn with_process_names(mut self, names: Vec<String>) -> Self {
        self.process_names = names;
        self
    }

    /// Overrides the terminate-to-kill grace period.
    pub fn with_kill_wait(mut self, wait: Duration) -> Self {
        self.kill_wait = wait;
        self
    }
}

impl BrowserReaper for ProcessReaper {
    fn reap(&self, roots: &[PathBuf]) -> usize {
        if roots.is_empty() {
            return 0;
        }

        let mut sys = System::new_all();
        let mut targets: Vec<Pid> = Vec::new();

        for (pid, process) in sys.processes() {
            if is_fleet_process(process.name(), process.cmd(), &self.process_names, roots) {
                info!(pid = pid.as_u32(), name = process.name(), "Terminating orphaned browser process");
                if process.kill_with(Signal::Term).is_none() {
                    // Platform without SIGTERM support; go straight to kill.
                    process.kill();
                }
                targets.push(*pid);
            }
        }

        if targets.is_empty() {
            debug!("No orphaned browser processes found");
            return 0;
        }
        let reaped = targets.len();

        // Give terminated processes a bounded window to exit.
        let deadline = Instant::now() + self.kill_wait;
        while !targets.is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(500));
            sys.refresh_processes();
            targets.retain(|pid| sys.process(*pid).is_some());
        }

        for pid in &targets {
            if let Some(process) = sys.process(*pid) {
                warn!(pid = pid.as_u32(), "Force-killing browser process");
                if !process.kill() {
                    warn!(pid = pid.as_u32(), "Browser process would not die");
                }
            }
        }

        reaped
    }
}

/// Profile reaper deleting `profile_*` directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSweeper;

impl ProfileSweeper {
    pub fn new() -> Self {
        Self
    }
}

impl ProfileReaper for ProfileSweeper {
    fn sweep(&self, profiles_dir: &Path) -> usize {
        let entries = match std::fs::read_dir(profiles_dir) {
            Ok(entries) => entries,
            Err(_) => {
                debug!(dir = %profiles_dir.display(), "No profiles directory to sweep");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_profile = path.is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with("profile_"));
            if !is_profile {
                continue;
            }

            match std::fs::remove_dir_all(&path) {
                Ok(()) => {
                    removed += 1;
                    debug!(dir = %path.display(), "Removed leftover profile directory");
                }
                Err(e) => {
                    warn!(dir = %path.display(), error = %e, "Failed to remove profile directory");
                }
            }
        }

        if removed > 0 {
            info!(removed, dir = %profiles_dir.display(), "Swept leftover profile directories");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fleet_process_matching() {
        let names = strings(&["chrome", "chromedriver"]);
        let roots = vec![PathBuf::from("/work/run1/profiles")];

        // Browser name + our working directory on the command line.
        assert!(is_fleet_process(
            "chrome",
            &strings(&["--user-data-dir=/work/run1/profiles/profile_abc"]),
            &names,
            &roots,
        ));

        // Right name, unrelated command line: someone else's browser.
        assert!(!is_fleet_process(
            "chrome",
            &strings(&["--user-data-dir=/home/user/.config/chrome"]),
            &names,
            &roots,
        ));

        // Our directory but an unrelated process name.
        assert!(!is_fleet_process(
            "editor",
            &strings(&["/work/run1/profiles/notes.txt"]),
            &names,
            &roots,
        ));

        // Matching is case-insensitive on the process name.
        assert!(is_fleet_process(
            "Chrome.exe",
            &strings(&["/work/run1/profiles/profile_x"]),
            &names,
            &roots,
        ));
    }

    #[test]
    fn test_reap_with_no_roots_is_noop() {
        let reaper = ProcessReaper::new().with_kill_wait(Duration::from_millis(10));
        assert_eq!(reaper.reap(&[]), 0);
    }

    #[test]
    fn test_profile_sweep_removes_only_profile_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = dir.path();

        std::fs::create_dir(profiles.join("profile_one")).unwrap();
        std::fs::create_dir(profiles.join("profile_two")).unwrap();
        std::fs::create_dir(profiles.join("keep_me")).unwrap();
        std::fs::write(profiles.join("profile_file.txt"), "not a dir").unwrap();

        let removed = ProfileSweeper::new().sweep(profiles);

        assert_eq!(removed, 2);
        assert!(!profiles.join("profile_one").exists());
        assert!(!profiles.join("profile_two").exists());
        assert!(profiles.join("keep_me").exists());
        assert!(profiles.join("profile_file.txt").exists());
    }

    #[test]
    fn test_profile_sweep_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let removed = ProfileSweeper::new().sweep(&dir.path().join("absent"));
        assert_eq!(removed, 0);
    }
}
