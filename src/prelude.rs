//! Prelude module for VNS Fetcher Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use vns_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use vns_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let client = ClientConfig::default()
//!         .build_http_client()
//!         .map_err(CatalogError::from)?;
//!     let catalog = CatalogClient::new(client.clone(), &config.catalog.to_runtime_config(), HTTP_TIMEOUT)?;
//!     let regions = catalog.fetch().await?;
//!
//!     let launcher = BatchLauncher::new(config.processor.to_runtime_config(), client, CHANNEL_CAPACITY);
//!     let summary = launcher.launch(regions.into_iter().take(1).collect()).join().await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, CatalogError, ProcessError, Result};

// Configuration
pub use crate::config::AppConfig;

// Essential app components that are used in most integrations
pub use crate::app::{
    // Batch execution
    BatchLauncher,
    BatchRunner,
    BatchSummary,
    // Catalog
    CatalogClient,
    CatalogConfig,
    ClientConfig,
    // Hierarchy
    Geography,
    Location,
    LocationResolver,
    PipelineStep,
    ProcessingUpdate,
    ProcessorConfig,
    ProgressAggregator,
    ProgressBridge,
    Region,
    RegionProcessor,
    RegionTree,
    StepStatus,
    filter_regions,
};

// Commonly used constants
pub use crate::constants::{
    CHANNEL_CAPACITY, DEFAULT_MEMORY_MB, FRESHNESS_WINDOW, HTTP_TIMEOUT, INDEX_URL, USER_AGENT,
};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};

// Cancellation is part of the batch API
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _config = AppConfig::default();
        let _client_config = ClientConfig::default();
        let _processor_config = ProcessorConfig::default();

        assert_eq!(PipelineStep::COUNT, 5);
        assert!(USER_AGENT.contains("VNS-Fetcher"));
    }

    #[tokio::test]
    async fn test_prelude_integration_pattern() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let catalog_config = CatalogConfig {
            cache_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let client = ClientConfig::default().build_http_client().unwrap();

        let catalog = CatalogClient::new(client, &catalog_config, HTTP_TIMEOUT).unwrap();
        assert!(catalog.store().load().await.is_none());
        assert_eq!(catalog.freshness(), FRESHNESS_WINDOW);
    }

    #[test]
    fn test_std_reexports() {
        let path = PathBuf::from("/tmp/test");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("test"));
    }
}
