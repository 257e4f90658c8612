//! Arena-backed permission forest.
//!
//! The administrative surface stores permissions as flat rows with a parent
//! id. [`PermissionTree::from_flat`] is the single place that turns those
//! rows into a tree; [`PermissionTree::to_flat`] goes back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use warden_core::error::AppError;
use warden_core::result::AppResult;

use super::model::Permission;

/// A nested view of one permission and its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionNode {
    /// Permission ID.
    pub id: i64,
    /// Permission name.
    pub name: String,
    /// Child permissions, in catalog order.
    pub children: Vec<PermissionNode>,
}

/// Validated permission forest.
///
/// Invariants: ids and names are unique, every parent exists, no cycles.
/// Sibling order follows the order of the input rows.
#[derive(Debug, Clone, Default)]
pub struct PermissionTree {
    nodes: Vec<Permission>,
    by_id: HashMap<i64, usize>,
    by_name: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl PermissionTree {
    /// Builds the forest from flat rows, rejecting dangling parents,
    /// duplicates and cycles.
    pub fn from_flat(rows: Vec<Permission>) -> AppResult<Self> {
        let mut by_id = HashMap::with_capacity(rows.len());
        let mut by_name = HashMap::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            if by_id.insert(row.id, idx).is_some() {
                return Err(AppError::validation(format!(
                    "Duplicate permission id {}",
                    row.id
                )));
            }
            if by_name.insert(row.name.clone(), idx).is_some() {
                return Err(AppError::validation(format!(
                    "Duplicate permission name '{}'",
                    row.name
                )));
            }
        }

        let mut children = vec![Vec::new(); rows.len()];
        let mut roots = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            match row.parent_id {
                None => roots.push(idx),
                Some(parent) => {
                    let parent_idx = *by_id.get(&parent).ok_or_else(|| {
                        AppError::validation(format!(
                            "Permission '{}' references missing parent {parent}",
                            row.name
                        ))
                    })?;
                    children[parent_idx].push(idx);
                }
            }
        }

        let tree = Self {
            nodes: rows,
            by_id,
            by_name,
            children,
            roots,
        };
        tree.check_acyclic()?;
        Ok(tree)
    }

    /// Every node must be reachable from a root; anything left over sits on a cycle.
    fn check_acyclic(&self) -> AppResult<()> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.roots.clone();
        while let Some(idx) = stack.pop() {
            seen[idx] = true;
            stack.extend(self.children[idx].iter().copied());
        }

        match seen.iter().position(|s| !s) {
            None => Ok(()),
            Some(idx) => Err(AppError::validation(format!(
                "Permission '{}' is part of a parent cycle",
                self.nodes[idx].name
            ))),
        }
    }

    /// Returns the rows in their original order.
    pub fn to_flat(&self) -> Vec<Permission> {
        self.nodes.clone()
    }

    /// Returns the nested representation.
    pub fn nested(&self) -> Vec<PermissionNode> {
        self.roots.iter().map(|&idx| self.build_node(idx)).collect()
    }

    fn build_node(&self, idx: usize) -> PermissionNode {
        let row = &self.nodes[idx];
        PermissionNode {
            id: row.id,
            name: row.name.clone(),
            children: self.children[idx]
                .iter()
                .map(|&child| self.build_node(child))
                .collect(),
        }
    }

    /// Looks up a permission by id.
    pub fn get(&self, id: i64) -> Option<&Permission> {
        self.by_id.get(&id).map(|&idx| &self.nodes[idx])
    }

    /// Looks up a permission by name.
    pub fn find_by_name(&self, name: &str) -> Option<&Permission> {
        self.by_name.get(name).map(|&idx| &self.nodes[idx])
    }

    /// Whether a permission with this exact name exists.
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All permission names, in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|p| p.name.as_str())
    }

    /// Direct children of a permission.
    pub fn children_of(&self, id: i64) -> Vec<&Permission> {
        self.by_id
            .get(&id)
            .map(|&idx| {
                self.children[idx]
                    .iter()
                    .map(|&child| &self.nodes[child])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: i64) -> Vec<&Permission> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|p| p.parent_id);
        while let Some(parent_id) = current {
            match self.get(parent_id) {
                Some(parent) => {
                    chain.push(parent);
                    current = parent.parent_id;
                }
                None => break,
            }
        }
        chain
    }

    /// Number of permissions in the catalog.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
