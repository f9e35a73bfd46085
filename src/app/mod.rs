//! Core application logic for VNS Fetcher
//!
//! This module holds everything below the user interface: the region catalog
//! and its cache, the location hint, the region hierarchy, the per-region
//! pipeline and the progress plumbing that connects a running batch to
//! whatever is displaying it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use vns_fetcher::app::{BatchRunner, ClientConfig, ProcessorConfig, ProgressSender, Region, RegionProcessor};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientConfig::default().build_http_client()?;
//! let processor = RegionProcessor::new(ProcessorConfig::default(), client, ProgressSender::disabled());
//!
//! let region = Region::new("europe/andorra", "Andorra")
//!     .with_url("pbf", "https://download.geofabrik.de/europe/andorra-latest.osm.pbf");
//! let summary = BatchRunner::new(processor)
//!     .run(vec![region], CancellationToken::new())
//!     .await;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod location;
pub mod models;
pub mod processor;
pub mod progress;
pub mod signals;
pub mod tree;

// Re-export main public API
pub use catalog::{CacheInfo, CatalogClient, CatalogConfig, CatalogStore, RegionCache};
pub use client::{ClientConfig, DownloadProgress, Downloader};
pub use location::{Location, LocationConfig, LocationResolver};
pub use models::Region;
pub use processor::{
    BatchRunner, BatchSummary, ImportCommand, PipelineStep, ProcessingUpdate, ProcessorConfig,
    RegionFailure, RegionPaths, RegionProcessor, StepStatus,
};
pub use progress::{BatchLauncher, ProgressAggregator, ProgressBridge, ProgressSender};
pub use tree::{filter_regions, Geography, LocationFocus, RegionTree};
