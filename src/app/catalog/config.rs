//! Catalog source and cache configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::catalog;
use crate::errors::{CatalogError, CatalogResult};

/// Runtime catalog configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Catalog index endpoint
    pub url: String,
    /// Explicit cache directory; `None` uses the per-user cache directory
    pub cache_dir: Option<PathBuf>,
    /// Maximum snapshot age that is reused without refetching
    pub freshness: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: catalog::INDEX_URL.to_string(),
            cache_dir: None,
            freshness: catalog::FRESHNESS_WINDOW,
        }
    }
}

impl CatalogConfig {
    /// Resolve the directory holding the catalog snapshot
    pub fn resolve_cache_dir(&self) -> CatalogResult<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|dir| dir.join(catalog::CACHE_DIR_NAME))
            .ok_or(CatalogError::NoCacheDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_cache_dir_wins() {
        let config = CatalogConfig {
            cache_dir: Some(PathBuf::from("/tmp/vns-cache")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_cache_dir().unwrap(),
            PathBuf::from("/tmp/vns-cache")
        );
    }

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.url, catalog::INDEX_URL);
        assert_eq!(config.freshness, Duration::from_secs(86_400));
    }
}
