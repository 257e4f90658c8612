//! Static navigation nodes.

use serde::{Deserialize, Serialize};

/// One entry of the navigation tree.
///
/// Carries data only; icons and styling belong to whoever renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    /// Stable identifier, also the key used by the personal hide list.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Route this entry navigates to; `None` for a pure container.
    pub path: Option<String>,
    /// Permission the viewer must hold for this node to show.
    pub required_permission: Option<String>,
    /// Child entries, in display order.
    #[serde(default)]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    /// A navigable entry.
    pub fn link(id: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            path: Some(path.into()),
            required_permission: None,
            children: Vec::new(),
        }
    }

    /// A heading that only groups children.
    pub fn container(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            path: None,
            required_permission: None,
            children: Vec::new(),
        }
    }

    /// Gates this node behind a permission.
    pub fn requires(mut self, permission: impl Into<String>) -> Self {
        self.required_permission = Some(permission.into());
        self
    }

    /// Replaces the children.
    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    /// Whether this node has no route of its own.
    pub fn is_container(&self) -> bool {
        self.path.is_none()
    }

    /// Depth-first search for a node by id, including `self`.
    pub fn find(&self, id: &str) -> Option<&MenuNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Calls `visit` on this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MenuNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Searches a forest for a node by id.
pub fn find_in<'a>(tree: &'a [MenuNode], id: &str) -> Option<&'a MenuNode> {
    tree.iter().find_map(|node| node.find(id))
}

/// Collects every node id in a forest, parents first.
pub fn collect_ids(tree: &[MenuNode]) -> Vec<String> {
    let mut ids = Vec::new();
    for node in tree {
        node.walk(&mut |n| ids.push(n.id.clone()));
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<MenuNode> {
        vec![
            MenuNode::link("dashboard", "首页概览", "/"),
            MenuNode::container("system", "系统管理").with_children(vec![
                MenuNode::link("user", "用户维护", "/users").requires("用户管理"),
                MenuNode::link("role", "角色管理", "/roles").requires("角色管理"),
            ]),
        ]
    }

    #[test]
    fn test_find_and_collect() {
        let tree = sample();
        assert_eq!(
            find_in(&tree, "role").and_then(|n| n.required_permission.as_deref()),
            Some("角色管理")
        );
        assert!(find_in(&tree, "missing").is_none());
        assert_eq!(collect_ids(&tree), ["dashboard", "system", "user", "role"]);
    }

    #[test]
    fn test_container_flag() {
        let tree = sample();
        assert!(tree[1].is_container());
        assert!(!tree[0].is_container());
    }

    #[test]
    fn test_json_shape() {
        let node = MenuNode::link("param", "参数管理", "/params").requires("参数管理");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["requiredPermission"], "参数管理");
        assert_eq!(json["children"], serde_json::json!([]));
    }
}
