//! Category hierarchy: wire shape, derived indices, breadcrumbs.
//!
//! The catalog serves categories as a flat list; the index derives the
//! `by_id`/`by_handle` maps and the nested tree once per fetch, and every
//! consumer (navigation, breadcrumbs) reads from those without further
//! network calls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::CategoryId;

/// Flat category as served by `GET /api/categories`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawCategory {
    pub id: CategoryId,
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub product_count: i64,
}

/// Response envelope of `GET /api/categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub categories: Vec<RawCategory>,
}

/// A category with its derived hierarchy fields, as stored in the flat
/// indices. Invariant: `ancestor_handles.len() == depth`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedCategory {
    pub id: CategoryId,
    pub name: String,
    pub handle: String,
    pub parent_id: Option<CategoryId>,
    /// 0-based depth in the hierarchy.
    pub depth: usize,
    /// Handles from the root to the immediate parent, in order.
    pub ancestor_handles: Vec<String>,
    pub product_count: i64,
    /// Direct children, in input order.
    pub children_ids: Vec<CategoryId>,
}

impl IndexedCategory {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A category with nested children, for tree consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTreeNode {
    pub id: CategoryId,
    pub name: String,
    pub handle: String,
    pub depth: usize,
    pub product_count: i64,
    pub children: Vec<CategoryTreeNode>,
}

/// One step of a breadcrumb trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Breadcrumb {
    pub name: String,
    pub handle: String,
}

/// Derived indices over one category fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryIndex {
    by_id: HashMap<String, IndexedCategory>,
    by_handle: HashMap<String, CategoryId>,
    tree: Vec<CategoryTreeNode>,
    total: usize,
}

impl CategoryIndex {
    /// Build all indices from the flat list.
    ///
    /// Orphaned entries (parent not in the list, or a parent cycle) are
    /// treated as roots rather than dropped, so a partial catalog still
    /// renders.
    pub fn build(categories: &[RawCategory]) -> Self {
        let raw_by_id: HashMap<&str, &RawCategory> = categories
            .iter()
            .map(|c| (c.id.as_str(), c))
            .collect();

        let mut by_id: HashMap<String, IndexedCategory> = HashMap::new();
        let mut by_handle: HashMap<String, CategoryId> = HashMap::new();

        for cat in categories {
            let ancestors = ancestor_chain(cat, &raw_by_id);
            let indexed = IndexedCategory {
                id: cat.id.clone(),
                name: cat.name.clone(),
                handle: cat.handle.clone(),
                parent_id: effective_parent(cat, &raw_by_id),
                depth: ancestors.len(),
                ancestor_handles: ancestors,
                product_count: cat.product_count,
                children_ids: Vec::new(),
            };
            by_handle.insert(indexed.handle.clone(), indexed.id.clone());
            by_id.insert(indexed.id.as_str().to_string(), indexed);
        }

        // Wire children in input order.
        for cat in categories {
            let Some(parent_id) = by_id
                .get(cat.id.as_str())
                .and_then(|c| c.parent_id.clone())
            else {
                continue;
            };
            if let Some(parent) = by_id.get_mut(parent_id.as_str()) {
                parent.children_ids.push(cat.id.clone());
            }
        }

        let tree = categories
            .iter()
            .filter(|c| {
                by_id
                    .get(c.id.as_str())
                    .map(|i| i.is_root())
                    .unwrap_or(false)
            })
            .map(|c| build_tree_node(c.id.as_str(), &by_id))
            .collect();

        Self {
            total: by_id.len(),
            by_id,
            by_handle,
            tree,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn get(&self, id: &CategoryId) -> Option<&IndexedCategory> {
        self.by_id.get(id.as_str())
    }

    pub fn get_by_handle(&self, handle: &str) -> Option<&IndexedCategory> {
        self.by_handle
            .get(handle)
            .and_then(|id| self.by_id.get(id.as_str()))
    }

    /// Root nodes with nested children.
    pub fn tree(&self) -> &[CategoryTreeNode] {
        &self.tree
    }

    /// Every indexed category, unordered.
    pub fn flat(&self) -> impl Iterator<Item = &IndexedCategory> {
        self.by_id.values()
    }

    /// Root categories, in tree order.
    pub fn roots(&self) -> Vec<&IndexedCategory> {
        self.tree
            .iter()
            .filter_map(|n| self.by_id.get(n.id.as_str()))
            .collect()
    }

    /// Direct children of a category.
    pub fn children_of(&self, id: &CategoryId) -> Vec<&IndexedCategory> {
        self.get(id)
            .map(|c| {
                c.children_ids
                    .iter()
                    .filter_map(|child| self.by_id.get(child.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Clickable trail from the root to the category itself.
    pub fn breadcrumb_trail(&self, handle: &str) -> Vec<Breadcrumb> {
        let Some(cat) = self.get_by_handle(handle) else {
            return Vec::new();
        };

        let mut trail: Vec<Breadcrumb> = cat
            .ancestor_handles
            .iter()
            .filter_map(|h| self.get_by_handle(h))
            .map(|c| Breadcrumb {
                name: c.name.clone(),
                handle: c.handle.clone(),
            })
            .collect();
        trail.push(Breadcrumb {
            name: cat.name.clone(),
            handle: cat.handle.clone(),
        });
        trail
    }
}

/// Walk `parent_id` links to the root, returning ancestor handles in
/// root-first order. Cycles and dangling parents terminate the walk.
fn ancestor_chain(cat: &RawCategory, raw_by_id: &HashMap<&str, &RawCategory>) -> Vec<String> {
    let mut chain = Vec::new();
    let mut seen = vec![cat.id.as_str()];
    let mut cursor = cat.parent_id.as_ref();

    while let Some(parent_id) = cursor {
        let Some(parent) = raw_by_id.get(parent_id.as_str()) else {
            break;
        };
        if seen.contains(&parent.id.as_str()) {
            break;
        }
        seen.push(parent.id.as_str());
        chain.push(parent.handle.clone());
        cursor = parent.parent_id.as_ref();
    }

    chain.reverse();
    chain
}

/// Parent id, dropped when it dangles or cycles (the node becomes a root).
fn effective_parent(
    cat: &RawCategory,
    raw_by_id: &HashMap<&str, &RawCategory>,
) -> Option<CategoryId> {
    let parent_id = cat.parent_id.as_ref()?;
    if parent_id == &cat.id || !raw_by_id.contains_key(parent_id.as_str()) {
        return None;
    }
    Some(parent_id.clone())
}

fn build_tree_node(id: &str, by_id: &HashMap<String, IndexedCategory>) -> CategoryTreeNode {
    let cat = &by_id[id];
    CategoryTreeNode {
        id: cat.id.clone(),
        name: cat.name.clone(),
        handle: cat.handle.clone(),
        depth: cat.depth,
        product_count: cat.product_count,
        children: cat
            .children_ids
            .iter()
            .map(|child| build_tree_node(child.as_str(), by_id))
            .collect(),
    }
}
