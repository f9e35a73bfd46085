//! Data models for catalog regions
//!
//! A [`Region`] is one downloadable Geofabrik extract. Regions are immutable
//! once fetched; everything the UI or the pipeline needs to know about a
//! region (its folder name, its work directory, whether it matches a filter)
//! is derived from the id and name on demand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{catalog, processor};

/// A single selectable catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Stable identifier, may encode a path such as `us/california`
    pub id: String,
    /// Display name, possibly qualified with the parent name
    pub name: String,
    /// Parent identifier, absent for top-level entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Resource kind to download locator
    #[serde(default)]
    pub urls: BTreeMap<String, String>,
}

impl Region {
    /// Create a region with no parent and no locators
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: None,
            urls: BTreeMap::new(),
        }
    }

    /// Builder-style parent assignment
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Builder-style locator assignment
    pub fn with_url(mut self, kind: impl Into<String>, url: impl Into<String>) -> Self {
        self.urls.insert(kind.into(), url.into());
        self
    }

    /// Locator of the mandatory map data extract
    pub fn primary_extract_url(&self) -> Option<&str> {
        self.urls
            .get(catalog::PRIMARY_EXTRACT_KIND)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    /// Last path segment of the id, used as the output folder name
    pub fn folder_name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }

    /// Unique per-region work directory name
    pub fn work_dir_name(&self) -> String {
        format!("{}{}", processor::WORK_DIR_PREFIX, self.id.replace('/', "-"))
    }

    /// Case-insensitive substring match on name or id
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.id.to_lowercase().contains(needle)
    }
}

/// Turn an identifier such as `united-kingdom` into `United Kingdom`
pub fn title_case(id: &str) -> String {
    id.split(|c: char| c == '-' || c == '_' || c == ' ' || c == '/')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
