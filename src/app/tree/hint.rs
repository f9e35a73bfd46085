//! Pre-expanding the tree around the operator's detected location
//!
//! Only expansion flags are touched; selection and processing never depend on
//! anything decided here.

use super::geography::Geography;
use super::{RegionTree, TreeNode};
use crate::app::location::Location;
use crate::app::models::Region;

/// Result of applying a location hint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFocus {
    /// Region id the cursor should start on
    pub target_leaf: Option<String>,
    /// Status line describing what was opened
    pub message: Option<String>,
}

impl RegionTree {
    /// Expand the continent and country matching `location`
    ///
    /// For a split country (states kept in their own container) the state
    /// container is expanded and the state leaf becomes the cursor target.
    /// Elsewhere the target is the leaf named after the detected region, or
    /// the country's own leaf.
    pub fn apply_location_hint(
        &mut self,
        location: &Location,
        regions: &[Region],
        geography: &Geography,
    ) -> LocationFocus {
        if !location.found {
            return LocationFocus::default();
        }
        let Some(country) = geography.country_id(&location.country) else {
            return LocationFocus::default();
        };
        let Some(continent) = geography
            .continent_of_country(country)
            .map(|c| geography.canonical_continent(c).unwrap_or(c).to_string())
        else {
            return LocationFocus::default();
        };

        let Some(continent_node) = self.roots.iter_mut().find(|node| node.id == continent) else {
            return LocationFocus::default();
        };
        continent_node.expanded = true;

        let mut target = None;

        // Country container holding the country's subdivisions
        if let Some(country_node) = continent_node
            .children
            .iter_mut()
            .find(|node| node.id == country)
        {
            country_node.expanded = true;
            target = subdivision_target(country_node, country, location, regions, geography);
        }

        // Country as a leaf of some other group (e.g. Germany under Europe)
        if target.is_none() && !geography.is_split_country(country) {
            for group in continent_node.children.iter_mut() {
                if let Some(leaf) = group
                    .children
                    .iter()
                    .find(|leaf| leaf.region.map(|i| regions[i].id.as_str()) == Some(country))
                {
                    target = Some(leaf.id.clone());
                    group.expanded = true;
                    break;
                }
            }
        }

        let message = if location.region.is_empty() {
            format!("📍 Opened {} regions for you", location.country)
        } else {
            format!(
                "📍 Opened {}, {} regions for you",
                location.region, location.country
            )
        };

        LocationFocus {
            target_leaf: target,
            message: Some(message),
        }
    }
}

/// Leaf inside `country_node` matching the detected subdivision
fn subdivision_target(
    country_node: &TreeNode,
    country: &str,
    location: &Location,
    regions: &[Region],
    geography: &Geography,
) -> Option<String> {
    if location.region.is_empty() {
        return None;
    }

    if let Some(id) = geography.subdivision_id(country, &location.region) {
        return country_node
            .children
            .iter()
            .find(|leaf| leaf.id == id)
            .map(|leaf| leaf.id.clone());
    }

    let wanted = location.region.to_lowercase();
    country_node
        .children
        .iter()
        .filter_map(|leaf| leaf.region.map(|i| (leaf, &regions[i])))
        .find(|(_, region)| base_name(&region.name).to_lowercase() == wanted)
        .map(|(leaf, _)| leaf.id.clone())
}

/// Display name without the parenthetical parent qualifier
fn base_name(name: &str) -> &str {
    name.split(" (").next().unwrap_or(name)
}
