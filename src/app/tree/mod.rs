//! Region hierarchy for the selection UI
//!
//! The flat catalog is grouped into continent → country → region. The tree is
//! always rebuilt from scratch from the region list; only the expansion flags
//! change afterwards.
//!
//! Leaf nodes refer to regions by their index in the backing `[Region]`
//! slice, which keeps selection state independent of tree layout.

pub mod builder;
pub mod geography;
pub mod hint;

use crate::app::models::Region;

pub use geography::{Continent, Geography};
pub use hint::LocationFocus;

/// One node of the display hierarchy
///
/// A node either groups children or refers to exactly one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Identifier (continent id, country key or region id)
    pub id: String,
    /// Display label
    pub name: String,
    /// Depth, 0 for continents
    pub level: usize,
    /// Whether children are shown
    pub expanded: bool,
    /// Child nodes, empty for leaves
    pub children: Vec<TreeNode>,
    /// Index of the referenced region, leaves only
    pub region: Option<usize>,
}

impl TreeNode {
    /// Create a grouping node
    pub fn group(
        id: impl Into<String>,
        name: impl Into<String>,
        level: usize,
        children: Vec<TreeNode>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            expanded: false,
            children,
            region: None,
        }
    }

    /// Create a leaf node for the region at `region`
    pub fn leaf(
        id: impl Into<String>,
        name: impl Into<String>,
        level: usize,
        region: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            expanded: false,
            children: Vec::new(),
            region: Some(region),
        }
    }

    /// Whether this node refers to a region
    pub fn is_leaf(&self) -> bool {
        self.region.is_some()
    }

    fn collect_leaves(&self, out: &mut Vec<usize>) {
        if let Some(region) = self.region {
            out.push(region);
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }
}

/// What a visible row points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// Grouping node at `path` (child indices from the roots)
    Group {
        path: Vec<usize>,
        expanded: bool,
        children: usize,
    },
    /// Leaf for the region at this index
    Leaf { region: usize },
}

/// A row of the flattened, currently visible list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub label: String,
    pub level: usize,
    pub kind: RowKind,
}

impl VisibleRow {
    /// Region index if this row is a leaf
    pub fn region(&self) -> Option<usize> {
        match self.kind {
            RowKind::Leaf { region } => Some(region),
            RowKind::Group { .. } => None,
        }
    }
}

/// Continent → country → region hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionTree {
    roots: Vec<TreeNode>,
}

impl RegionTree {
    /// Wrap already built roots
    pub fn from_roots(roots: Vec<TreeNode>) -> Self {
        Self { roots }
    }

    /// Root (continent) nodes in display order
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Visible rows following expansion flags, depth first
    pub fn flatten(&self) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        let mut path = Vec::new();
        for (index, root) in self.roots.iter().enumerate() {
            path.push(index);
            flatten_into(root, &mut path, &mut rows);
            path.pop();
        }
        rows
    }

    /// Mutable access to the node at `path`
    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut TreeNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for index in rest {
            node = node.children.get_mut(*index)?;
        }
        Some(node)
    }

    /// Flip the expansion flag of the group at `path`
    ///
    /// Returns the new flag, or `None` if `path` does not name a group.
    pub fn toggle(&mut self, path: &[usize]) -> Option<bool> {
        let node = self.node_mut(path)?;
        if node.is_leaf() {
            return None;
        }
        node.expanded = !node.expanded;
        Some(node.expanded)
    }

    /// Region indices of every leaf, in tree order
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.collect_leaves(&mut out);
        }
        out
    }
}

fn flatten_into(node: &TreeNode, path: &mut Vec<usize>, rows: &mut Vec<VisibleRow>) {
    let kind = match node.region {
        Some(region) => RowKind::Leaf { region },
        None => RowKind::Group {
            path: path.clone(),
            expanded: node.expanded,
            children: node.children.len(),
        },
    };
    rows.push(VisibleRow {
        label: node.name.clone(),
        level: node.level,
        kind,
    });

    if node.expanded {
        for (index, child) in node.children.iter().enumerate() {
            path.push(index);
            flatten_into(child, path, rows);
            path.pop();
        }
    }
}

/// Indices of regions whose name or id contains `query`, case-insensitively
///
/// Catalog order is preserved; an empty query returns every index.
pub fn filter_regions(regions: &[Region], query: &str) -> Vec<usize> {
    let needle = query.to_lowercase();
    regions
        .iter()
        .enumerate()
        .filter(|(_, region)| region.matches(&needle))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Vec<Region> {
        vec![
            Region::new("andorra", "Andorra").with_parent("europe"),
            Region::new("bayern", "Bayern (Germany)").with_parent("germany"),
            Region::new("berlin", "Berlin (Germany)").with_parent("germany"),
            Region::new("us/new-york", "New York (United States of America)").with_parent("us"),
        ]
    }

    fn sample_tree() -> RegionTree {
        RegionTree::from_roots(vec![TreeNode::group(
            "europe",
            "🌍 Europe",
            0,
            vec![
                TreeNode::group(
                    "europe",
                    "🗺️ Europe",
                    1,
                    vec![TreeNode::leaf("andorra", "Andorra", 2, 0)],
                ),
                TreeNode::group(
                    "germany",
                    "🇩🇪 Germany",
                    1,
                    vec![
                        TreeNode::leaf("bayern", "Bayern (Germany)", 2, 1),
                        TreeNode::leaf("berlin", "Berlin (Germany)", 2, 2),
                    ],
                ),
            ],
        )])
    }

    #[test]
    fn test_flatten_respects_expansion() {
        let mut tree = sample_tree();
        assert_eq!(tree.flatten().len(), 1);

        assert_eq!(tree.toggle(&[0]), Some(true));
        let rows = tree.flatten();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].label, "🇩🇪 Germany");

        assert_eq!(tree.toggle(&[0, 1]), Some(true));
        let rows = tree.flatten();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[3].region(), Some(1));
        assert_eq!(rows[3].level, 2);
        assert_eq!(
            rows[2].kind,
            RowKind::Group {
                path: vec![0, 1],
                expanded: true,
                children: 2
            }
        );

        // Collapsing the continent hides everything below it again
        assert_eq!(tree.toggle(&[0]), Some(false));
        assert_eq!(tree.flatten().len(), 1);
    }

    #[test]
    fn test_toggle_rejects_leaves_and_bad_paths() {
        let mut tree = sample_tree();
        assert_eq!(tree.toggle(&[0, 1, 0]), None);
        assert_eq!(tree.toggle(&[5]), None);
        assert_eq!(tree.toggle(&[]), None);
    }

    #[test]
    fn test_leaves_in_tree_order() {
        assert_eq!(sample_tree().leaves(), vec![0, 1, 2]);
    }

    #[test]
    fn test_filter_empty_returns_everything() {
        let regions = regions();
        assert_eq!(filter_regions(&regions, ""), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_filter_matches_name_or_id_case_insensitively() {
        let regions = regions();
        assert_eq!(filter_regions(&regions, "GERMANY"), vec![1, 2]);
        assert_eq!(filter_regions(&regions, "us/new"), vec![3]);
        assert_eq!(filter_regions(&regions, "zzz"), Vec::<usize>::new());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let regions = regions();
        for query in ["", "er", "Ber", "new york", "x"] {
            let first: Vec<Region> = filter_regions(&regions, query)
                .into_iter()
                .map(|i| regions[i].clone())
                .collect();
            let second: Vec<Region> = filter_regions(&first, query)
                .into_iter()
                .map(|i| first[i].clone())
                .collect();
            assert_eq!(first, second, "query {:?}", query);
        }
    }
}
