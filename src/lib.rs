//! VNS Fetcher Library
//!
//! A Rust library for turning Geofabrik region extracts into zipped routing
//! graphs. Provides the region catalog with its local cache, the region
//! hierarchy and selection UI, and a sequential per-region pipeline with
//! cancellation and progress reporting.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;
pub mod tui;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
