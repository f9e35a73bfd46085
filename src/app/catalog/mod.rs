//! Region catalog client
//!
//! Fetches the Geofabrik index, curates it into processable regions and keeps
//! a time-boxed local snapshot so repeated launches do not hit the network.
//!
//! Curation rules:
//! - entries without a primary extract locator are dropped
//! - continent aggregates are dropped
//! - entries whose parent is not a continent get a `(Parent Name)` suffix
//! - the result is sorted by display name, byte-wise

pub mod cache;
pub mod config;

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::ETAG;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::app::models::{title_case, Region};
use crate::constants::catalog;
use crate::errors::{CatalogError, CatalogResult};

pub use cache::{CacheInfo, CatalogStore, RegionCache};
pub use config::CatalogConfig;

/// Raw index document
#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    properties: Region,
}

/// Whether `id` names a top-level continent aggregate
pub fn is_continent(id: &str) -> bool {
    catalog::CONTINENT_IDS.contains(&id)
}

/// Parse an index document and curate it
///
/// # Errors
///
/// Returns `CatalogError::Parse` if the body is not the expected JSON shape.
pub fn parse_catalog(body: &str) -> CatalogResult<Vec<Region>> {
    let index: RawIndex = serde_json::from_str(body)?;
    Ok(curate(
        index
            .features
            .into_iter()
            .map(|feature| feature.properties)
            .collect(),
    ))
}

/// Filter, qualify and sort raw catalog entries
pub fn curate(raw: Vec<Region>) -> Vec<Region> {
    let names: HashMap<String, String> = raw
        .iter()
        .map(|region| (region.id.clone(), region.name.clone()))
        .collect();

    let mut regions: Vec<Region> = raw
        .into_iter()
        .filter(|region| region.primary_extract_url().is_some() && !is_continent(&region.id))
        .map(|mut region| {
            if let Some(parent) = region.parent.as_deref() {
                if !is_continent(parent) {
                    let parent_name = names
                        .get(parent)
                        .cloned()
                        .unwrap_or_else(|| title_case(parent));
                    region.name = format!("{} ({})", region.name, parent_name);
                }
            }
            region
        })
        .collect();

    regions.sort_by(|a, b| a.name.cmp(&b.name));
    regions
}

/// Catalog client with a local snapshot cache
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    url: String,
    freshness: Duration,
    request_timeout: Duration,
    store: CatalogStore,
}

impl CatalogClient {
    /// Create a client for the configured endpoint and cache directory
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoCacheDir` if no cache directory is configured
    /// and the platform has no user cache directory.
    pub fn new(
        client: Client,
        config: &CatalogConfig,
        request_timeout: Duration,
    ) -> CatalogResult<Self> {
        let store = CatalogStore::new(config.resolve_cache_dir()?);
        Ok(Self {
            client,
            url: config.url.clone(),
            freshness: config.freshness,
            request_timeout,
            store,
        })
    }

    /// Snapshot store backing this client
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Freshness window applied to the snapshot
    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Return the catalog, from the snapshot when it is fresh
    pub async fn fetch(&self) -> CatalogResult<Vec<Region>> {
        if let Some(cache) = self.store.load().await {
            if cache.is_fresh_at(Utc::now(), self.freshness) {
                debug!(
                    "Using cached catalog with {} regions from {}",
                    cache.regions.len(),
                    cache.last_updated
                );
                return Ok(cache.regions);
            }
            debug!("Catalog cache from {} is stale", cache.last_updated);
        }

        self.refresh().await
    }

    /// Fetch the catalog from the network and overwrite the snapshot
    ///
    /// # Errors
    ///
    /// A transport failure, non-2xx status or malformed body fails the whole
    /// fetch; no partial catalog is returned or cached.
    pub async fn refresh(&self) -> CatalogResult<Vec<Region>> {
        info!("Fetching region catalog from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        let regions = parse_catalog(&body)?;

        info!("Catalog contains {} processable regions", regions.len());
        self.store
            .save(&RegionCache::new(regions.clone(), etag))
            .await?;

        Ok(regions)
    }
}
