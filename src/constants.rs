//! Application constants for VNS Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Region catalog source and cache
pub mod catalog {
    use super::Duration;

    /// Geofabrik index without geometries
    pub const INDEX_URL: &str = "https://download.geofabrik.de/index-v1-nogeom.json";

    /// How long a cached catalog snapshot is reused without refetching
    pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

    /// Snapshot file name inside the cache directory
    pub const CACHE_FILE_NAME: &str = "regions.json";

    /// Directory name under the user cache directory
    pub const CACHE_DIR_NAME: &str = "vns-fetcher";

    /// Top-level aggregates that are too coarse to process
    pub const CONTINENT_IDS: &[&str] = &[
        "africa",
        "antarctica",
        "asia",
        "australia-oceania",
        "central-america",
        "europe",
        "north-america",
        "oceania",
        "south-america",
    ];

    /// Resource kind of the primary extract in the `urls` mapping
    pub const PRIMARY_EXTRACT_KIND: &str = "pbf";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("VNS-Fetcher/", env!("CARGO_PKG_VERSION"));

    /// Catalog request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
}

/// IP geolocation lookup
pub mod location {
    use super::Duration;

    /// Providers tried in order; the first with a country wins
    pub const PROVIDERS: &[&str] = &["https://ipapi.co/json/", "http://ip-api.com/json/"];

    /// Per-provider bound
    pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(3);
}

/// Region pipeline constants
pub mod processor {
    use super::Duration;

    /// Default output directory relative to the working directory
    pub const DEFAULT_OUTPUT_DIR: &str = "output";

    /// Prefix of per-region work directories
    pub const WORK_DIR_PREFIX: &str = "vns-processing-";

    /// Heap size handed to the graph builder, in megabytes
    pub const DEFAULT_MEMORY_MB: u32 = 4096;

    /// Files the graph builder must leave in the graph directory
    pub const EXPECTED_ARTIFACTS: &[&str] = &["edges", "geometry", "nodes", "properties"];

    /// Number of trailing tool output lines kept for diagnostics
    pub const TAIL_LINES: usize = 20;

    /// Boundary file extensions derived from the extract URL
    pub const BOUNDARY_EXTENSIONS: &[&str] = &["poly", "kml"];

    /// Suffix stripped from extract file names to get the region stem
    pub const EXTRACT_SUFFIX: &str = "-latest.osm.pbf";

    /// Name of the generic timestamp file
    pub const TIMESTAMP_FILE: &str = "timestamp";

    /// UTC format written to timestamp files
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    /// Download progress is emitted each time this many bytes arrive
    pub const DOWNLOAD_PROGRESS_BYTES: u64 = 1024 * 1024;

    /// ...or after this much time since the last emission
    pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

    /// Import progress before the tool has said anything useful
    pub const IMPORT_PROGRESS_START: f64 = 10.0;

    /// Import progress ceiling until the subprocess exits
    pub const IMPORT_PROGRESS_CAP: f64 = 95.0;

    /// Suffix for in-flight downloads
    pub const PARTIAL_SUFFIX: &str = ".part";
}

/// Selection UI constants
pub mod ui {
    use super::Duration;

    /// Poll interval of the render loop
    pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

    /// Capacity of the progress channel between batch and UI
    pub const CHANNEL_CAPACITY: usize = 100;

    /// Terminal lines taken by title, status and help
    pub const RESERVED_LINES: u16 = 10;

    /// Fewest list rows rendered regardless of terminal height
    pub const MIN_VISIBLE_ITEMS: usize = 10;

    /// Most list rows rendered regardless of terminal height
    pub const MAX_VISIBLE_ITEMS: usize = 50;

    /// Terminal size assumed before the first resize event
    pub const DEFAULT_SIZE: (u16, u16) = (80, 24);
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    /// Log file written while the interactive UI owns the terminal
    pub const LOG_FILE_NAME: &str = "vns_fetcher.log";
}

// Re-export commonly used constants for convenience
pub use catalog::{FRESHNESS_WINDOW, INDEX_URL};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use processor::{DEFAULT_MEMORY_MB, EXPECTED_ARTIFACTS};
pub use ui::{CHANNEL_CAPACITY, TICK_INTERVAL};
