//! Command-line interface components
//!
//! This module contains CLI-specific code for the VNS Fetcher application,
//! including argument parsing, command handlers and the batch progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{CacheAction, CacheArgs, Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs};
pub use commands::{
    handle_cache, handle_config, handle_interactive, handle_process, resolve_region_ids,
};
pub use progress::{ProgressConfig, ProgressDisplay, TextReporter};
