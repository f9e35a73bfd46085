//! Local snapshot store for the region catalog
//!
//! The whole catalog is kept as one JSON file. A snapshot is either fresh and
//! reused as-is, or stale and replaced wholesale by the next fetch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app::models::Region;
use crate::constants::catalog;
use crate::errors::{CatalogError, CatalogResult};

/// Cached catalog snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionCache {
    /// Curated regions in display order
    pub regions: Vec<Region>,
    /// When the snapshot was fetched
    pub last_updated: DateTime<Utc>,
    /// Change indicator reported by the source (HTTP ETag)
    #[serde(default)]
    pub etag: Option<String>,
}

impl RegionCache {
    /// Create a snapshot stamped with the current time
    pub fn new(regions: Vec<Region>, etag: Option<String>) -> Self {
        Self {
            regions,
            last_updated: Utc::now(),
            etag,
        }
    }

    /// Age of the snapshot at `now`; a timestamp in the future counts as zero
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_updated).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the snapshot may be reused at `now`
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age_at(now) < window
    }
}

/// Summary of the on-disk snapshot for `cache info`
#[derive(Debug, Clone)]
pub struct CacheInfo {
    /// Snapshot file location
    pub path: PathBuf,
    /// Number of cached regions
    pub region_count: usize,
    /// When the snapshot was fetched
    pub last_updated: DateTime<Utc>,
    /// Age at the time of the query
    pub age: Duration,
    /// Whether the snapshot is still inside the freshness window
    pub fresh: bool,
    /// Change indicator reported by the source
    pub etag: Option<String>,
}

/// File-backed snapshot store rooted at a cache directory
#[derive(Debug, Clone)]
pub struct CatalogStore {
    dir: PathBuf,
}

impl CatalogStore {
    /// Create a store rooted at `dir`; nothing is touched until first use
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot file path
    pub fn path(&self) -> PathBuf {
        self.dir.join(catalog::CACHE_FILE_NAME)
    }

    /// Load the snapshot, if one exists
    ///
    /// An unreadable or corrupt snapshot is treated as absent so the caller
    /// falls through to a refetch.
    pub async fn load(&self) -> Option<RegionCache> {
        let path = self.path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No catalog cache at {}", path.display());
                return None;
            }
            Err(e) => {
                warn!("Could not read catalog cache {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<RegionCache>(&content) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Ignoring corrupt catalog cache {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Persist a snapshot, replacing any previous one
    pub async fn save(&self, cache: &RegionCache) -> CatalogResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CatalogError::CacheIo {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.path();
        let temp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(cache)?;

        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|source| CatalogError::CacheIo {
                path: temp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|source| CatalogError::CacheIo {
                path: path.clone(),
                source,
            })?;

        debug!(
            "Saved {} regions to catalog cache {}",
            cache.regions.len(),
            path.display()
        );
        Ok(())
    }

    /// Remove the cache directory; a missing directory is not an error
    pub async fn clear(&self) -> CatalogResult<bool> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                info!("Cleared catalog cache {}", self.dir.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CatalogError::CacheIo {
                path: self.dir.clone(),
                source,
            }),
        }
    }

    /// Describe the current snapshot, if any
    pub async fn info(&self, window: Duration) -> Option<CacheInfo> {
        let cache = self.load().await?;
        let now = Utc::now();
        Some(CacheInfo {
            path: self.path(),
            region_count: cache.regions.len(),
            last_updated: cache.last_updated,
            age: cache.age_at(now),
            fresh: cache.is_fresh_at(now, window),
            etag: cache.etag,
        })
    }
}
