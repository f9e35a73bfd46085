//! HTTP plumbing shared by the catalog, location lookup and the pipeline
//!
//! - `config`: HTTP client configuration and building
//! - `download`: streaming downloads with throttled progress and cancellation

pub mod config;
pub mod download;

pub use config::ClientConfig;
pub use download::{DownloadProgress, Downloader, ProgressThrottle};
