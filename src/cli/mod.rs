//! Command-line interface for flotilla.
//!
//! Provides commands for dispatching automation runs and for standalone
//! cleanup of orphaned browser processes and profile directories.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, CleanArgs, Commands, RunArgs};
