//! Command-line argument parsing for VNS Fetcher
//!
//! This module defines the CLI structure using clap derive macros. Without a
//! subcommand the interactive selector starts; `--process` runs a batch
//! without any UI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// VNS Fetcher - prepare routing graphs for Geofabrik regions
#[derive(Parser, Debug)]
#[command(
    name = "vns_fetcher",
    version,
    about = "Select Geofabrik regions and turn them into zipped routing graphs",
    long_about = "Browse the Geofabrik region catalog in a terminal UI, select regions, and run each one through
download, graph import, organize, zip and cleanup. Use --process for unattended batches."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Process these region ids without the interactive UI (comma separated)
    #[arg(long, value_name = "IDS", value_delimiter = ',', num_args = 1..)]
    pub process: Option<Vec<String>>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Catalog cache directory
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory receiving graph folders and archives
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Region catalog cache management
    Cache(CacheArgs),

    /// Configuration file management
    Config(ConfigArgs),
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum CacheAction {
    /// Show the cached catalog snapshot
    Info,

    /// Remove the cache directory
    Clear,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    ///
    /// `None` means the configured level applies.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }

    /// Whether this invocation runs the full-screen selector
    pub fn is_interactive(&self) -> bool {
        self.command.is_none() && self.process.is_none()
    }

    /// Region ids given to `--process`, trimmed, empty entries dropped
    pub fn process_ids(&self) -> Option<Vec<String>> {
        self.process.as_ref().map(|ids| {
            ids.iter()
                .map(|id| id.trim())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
