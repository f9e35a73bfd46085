//! Building the region hierarchy from a flat catalog

use std::collections::{BTreeMap, HashMap};

use super::geography::{Geography, FALLBACK_CONTINENT};
use super::{RegionTree, TreeNode};
use crate::app::models::{title_case, Region};

/// Ancestor hops followed when looking for a region's continent
const MAX_ANCESTOR_DEPTH: usize = 8;

/// Marker for country groups keyed by a continent id
const CONTINENT_GROUP_MARKER: &str = "🗺️";

impl RegionTree {
    /// Group `regions` into continent → country → region
    ///
    /// Pure function of its inputs. Every region appears as exactly one leaf.
    /// Continents are ordered by priority, countries and leaves by display name.
    pub fn build(regions: &[Region], geography: &Geography) -> Self {
        let index: HashMap<&str, &Region> = regions
            .iter()
            .map(|region| (region.id.as_str(), region))
            .collect();

        let mut buckets: BTreeMap<String, BTreeMap<String, Vec<usize>>> = BTreeMap::new();
        for (position, region) in regions.iter().enumerate() {
            let continent = resolve_continent(region, &index, geography);
            let country = country_key(region).to_string();
            buckets
                .entry(continent)
                .or_default()
                .entry(country)
                .or_default()
                .push(position);
        }

        let mut continents: Vec<(u32, String, TreeNode)> = buckets
            .into_iter()
            .map(|(continent_id, countries)| {
                let continent = geography.continent(&continent_id);

                let mut country_nodes: Vec<(String, TreeNode)> = countries
                    .into_iter()
                    .map(|(key, mut members)| {
                        members.sort_by(|a, b| {
                            regions[*a]
                                .name
                                .cmp(&regions[*b].name)
                                .then_with(|| regions[*a].id.cmp(&regions[*b].id))
                        });
                        let leaves = members
                            .into_iter()
                            .map(|position| {
                                let region = &regions[position];
                                TreeNode::leaf(region.id.clone(), region.name.clone(), 2, position)
                            })
                            .collect();

                        let (sort_name, label) = country_label(&key, &index, geography);
                        (sort_name, TreeNode::group(key, label, 1, leaves))
                    })
                    .collect();
                country_nodes.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

                let node = TreeNode::group(
                    continent.id.clone(),
                    continent.label,
                    0,
                    country_nodes.into_iter().map(|(_, node)| node).collect(),
                );
                (continent.priority, continent.id, node)
            })
            .collect();

        continents.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        RegionTree::from_roots(continents.into_iter().map(|(_, _, node)| node).collect())
    }
}

/// Parent id if present, otherwise the region's own id
pub fn country_key(region: &Region) -> &str {
    region.parent.as_deref().unwrap_or(&region.id)
}

/// Continent bucket for a region
///
/// Walks the parent chain through the catalog, accepting the first ancestor
/// that is a continent or a mapped country, then tries the region itself.
pub fn resolve_continent(
    region: &Region,
    index: &HashMap<&str, &Region>,
    geography: &Geography,
) -> String {
    let canonical = |id: &str| {
        geography
            .canonical_continent(id)
            .unwrap_or(id)
            .to_string()
    };

    let mut current = region.parent.as_deref();
    let mut hops = 0;
    while let Some(id) = current {
        if let Some(continent) = geography.canonical_continent(id) {
            return continent.to_string();
        }
        if let Some(continent) = geography.continent_of_country(id) {
            return canonical(continent);
        }
        hops += 1;
        if hops >= MAX_ANCESTOR_DEPTH {
            break;
        }
        current = index.get(id).and_then(|ancestor| ancestor.parent.as_deref());
    }

    if let Some(continent) = geography.continent_of_country(&region.id) {
        return canonical(continent);
    }

    // Path-style ids such as `us/alabama` carry their country up front
    if let Some((prefix, _)) = region.id.split_once('/') {
        if let Some(continent) = geography.continent_of_country(prefix) {
            return canonical(continent);
        }
    }

    FALLBACK_CONTINENT.to_string()
}

/// Sort key and display label for a country group
fn country_label(
    key: &str,
    index: &HashMap<&str, &Region>,
    geography: &Geography,
) -> (String, String) {
    if geography.canonical_continent(key).is_some() {
        let name = title_case(key);
        return (name.clone(), format!("{} {}", CONTINENT_GROUP_MARKER, name));
    }

    let name = index
        .get(key)
        .map(|region| region.name.clone())
        .unwrap_or_else(|| title_case(key));
    let label = format!("{} {}", geography.flag(key), name);
    (name, label)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::app::tree::RowKind;

    fn fixture_geography() -> Geography {
        Geography::default()
            .with_continent("north-america", "NA", 1)
            .with_continent("europe", "EU", 2)
            .with_continent(FALLBACK_CONTINENT, "Other", 99)
            .with_country("us", "north-america")
            .with_country("germany", "europe")
            .with_flag("germany", "DE")
    }

    fn fixture_regions() -> Vec<Region> {
        vec![
            Region::new("germany", "Germany").with_parent("europe"),
            Region::new("bayern", "Bayern (Germany)").with_parent("germany"),
            Region::new("oberbayern", "Oberbayern (Bayern)").with_parent("bayern"),
            Region::new("andorra", "Andorra").with_parent("europe"),
            Region::new("us/texas", "Texas (United States of America)").with_parent("us"),
            Region::new("us/alabama", "Alabama (United States of America)").with_parent("us"),
            Region::new("atlantis", "Atlantis"),
        ]
    }

    fn leaves_of(node: &TreeNode) -> Vec<&TreeNode> {
        if node.is_leaf() {
            return vec![node];
        }
        node.children.iter().flat_map(leaves_of).collect()
    }

    #[test]
    fn test_every_region_is_exactly_one_leaf() {
        let regions = fixture_regions();
        let tree = RegionTree::build(&regions, &fixture_geography());

        let mut leaves = tree.leaves();
        leaves.sort_unstable();
        assert_eq!(leaves, (0..regions.len()).collect::<Vec<_>>());

        // Structural invariant: leaves carry a region and no children,
        // groups carry children and no region
        fn check(node: &TreeNode) {
            assert_ne!(node.region.is_some(), !node.children.is_empty());
            node.children.iter().for_each(check);
        }
        tree.roots().iter().for_each(check);
    }

    #[test]
    fn test_invariant_holds_for_duplicate_names_and_empty_input() {
        let empty = RegionTree::build(&[], &fixture_geography());
        assert!(empty.roots().is_empty());

        let regions = vec![
            Region::new("a", "Same").with_parent("germany"),
            Region::new("b", "Same").with_parent("germany"),
        ];
        let tree = RegionTree::build(&regions, &fixture_geography());
        let leaves: HashSet<usize> = tree.leaves().into_iter().collect();
        assert_eq!(leaves.len(), 2);
    }

    #[test]
    fn test_continent_priority_order() {
        let tree = RegionTree::build(&fixture_regions(), &fixture_geography());
        let ids: Vec<&str> = tree.roots().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["north-america", "europe", FALLBACK_CONTINENT]);
    }

    #[test]
    fn test_countries_and_leaves_sorted_by_name() {
        let regions = fixture_regions();
        let tree = RegionTree::build(&regions, &fixture_geography());

        let europe = &tree.roots()[1];
        let countries: Vec<&str> = europe.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            countries,
            vec!["🏳️ Bayern (Germany)", "🗺️ Europe", "DE Germany"]
        );

        let us = &tree.roots()[0].children[0];
        assert_eq!(us.id, "us");
        let states: Vec<&str> = leaves_of(us).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(states, vec!["us/alabama", "us/texas"]);
    }

    #[test]
    fn test_nested_regions_inherit_ancestor_continent() {
        let regions = fixture_regions();
        let index: HashMap<&str, &Region> = regions.iter().map(|r| (r.id.as_str(), r)).collect();
        let geography = fixture_geography();

        assert_eq!(resolve_continent(&regions[2], &index, &geography), "europe");
        assert_eq!(resolve_continent(&regions[4], &index, &geography), "north-america");
        assert_eq!(
            resolve_continent(&regions[6], &index, &geography),
            FALLBACK_CONTINENT
        );
    }

    #[test]
    fn test_path_prefix_maps_continent() {
        let region = Region::new("us/guam", "Guam");
        let index = HashMap::new();
        assert_eq!(
            resolve_continent(&region, &index, &fixture_geography()),
            "north-america"
        );
    }

    #[test]
    fn test_levels_and_initial_collapse() {
        let tree = RegionTree::build(&fixture_regions(), &fixture_geography());
        let rows = tree.flatten();

        // Everything starts collapsed: only continents are visible
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.level == 0));
        assert!(rows
            .iter()
            .all(|row| matches!(row.kind, RowKind::Group { expanded: false, .. })));
    }
}
