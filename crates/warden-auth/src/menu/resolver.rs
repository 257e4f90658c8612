//! Menu visibility resolution.
//!
//! Two independent sources decide whether a node shows: the personal hide
//! set and the node's own permission gate. A hidden node is dropped with its
//! whole subtree before its gate is looked at. A gate applies to its own node
//! only; children are judged on their own gates. Containers without a path
//! that end up with no visible children are dropped.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use warden_entity::menu::{LocalHideSet, MenuNode};

use crate::rbac::PermissionSet;

/// Filtered copy of `tree` for the given permissions and hide set.
///
/// Pure and order-preserving; the input is never modified.
pub fn resolve_visible_menu(
    tree: &[MenuNode],
    permissions: &PermissionSet,
    hidden: &LocalHideSet,
) -> Vec<MenuNode> {
    tree.iter()
        .filter_map(|node| resolve_node(node, permissions, hidden))
        .collect()
}

fn resolve_node(
    node: &MenuNode,
    permissions: &PermissionSet,
    hidden: &LocalHideSet,
) -> Option<MenuNode> {
    if hidden.contains(&node.id) {
        return None;
    }

    if let Some(required) = &node.required_permission {
        if !permissions.has(required) {
            return None;
        }
    }

    let children = resolve_visible_menu(&node.children, permissions, hidden);

    if node.path.is_none() && children.is_empty() {
        return None;
    }

    Some(MenuNode {
        id: node.id.clone(),
        label: node.label.clone(),
        path: node.path.clone(),
        required_permission: node.required_permission.clone(),
        children,
    })
}

/// A resolver bound to one static menu definition.
#[derive(Debug, Clone)]
pub struct MenuVisibilityResolver {
    tree: Arc<Vec<MenuNode>>,
}

impl MenuVisibilityResolver {
    /// Creates a resolver over `tree`.
    pub fn new(tree: Vec<MenuNode>) -> Self {
        Self {
            tree: Arc::new(tree),
        }
    }

    /// The unfiltered menu definition.
    pub fn definition(&self) -> &[MenuNode] {
        &self.tree
    }

    /// Visible menu for `permissions` with `hidden` applied.
    pub fn resolve(&self, permissions: &PermissionSet, hidden: &LocalHideSet) -> Vec<MenuNode> {
        resolve_visible_menu(&self.tree, permissions, hidden)
    }

    /// Reports nodes gated on a permission name that is not in `catalog`.
    ///
    /// Such nodes can never be shown. Each one is logged and returned as
    /// `(node id, permission name)`.
    pub fn unknown_requirements<'a, I>(&self, catalog: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: BTreeSet<&str> = catalog.into_iter().collect();
        let mut unknown = Vec::new();

        for root in self.tree.iter() {
            root.walk(&mut |node| {
                if let Some(required) = node.required_permission.as_deref() {
                    if !known.contains(required) {
                        warn!(
                            node = %node.id,
                            permission = %required,
                            "Menu node requires a permission missing from the catalog"
                        );
                        unknown.push((node.id.clone(), required.to_string()));
                    }
                }
            });
        }

        unknown
    }
}

#[cfg(test)]
mod tests {
    use warden_entity::menu::node::{collect_ids, find_in};

    use super::*;
    use crate::menu::catalog::system_menu;

    fn perms(names: &[&str]) -> PermissionSet {
        names.iter().copied().collect()
    }

    fn hides(ids: &[&str]) -> LocalHideSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_local_hide_beats_grant() {
        let menu = resolve_visible_menu(&system_menu(), &perms(&["角色管理"]), &hides(&["role"]));
        assert!(find_in(&menu, "role").is_none());
    }

    #[test]
    fn test_permission_gate_beats_absent_hide() {
        let menu = resolve_visible_menu(&system_menu(), &perms(&[]), &hides(&[]));
        assert!(find_in(&menu, "param").is_none());
    }

    #[test]
    fn test_empty_container_is_pruned() {
        let menu = resolve_visible_menu(&system_menu(), &perms(&["用户管理"]), &hides(&[]));
        assert!(find_in(&menu, "business").is_none());
        assert!(find_in(&menu, "audit").is_none());
        assert!(find_in(&menu, "system").is_some());
    }

    #[test]
    fn test_container_with_path_survives_without_children() {
        let tree = vec![
            MenuNode::link("reports", "报表", "/reports").with_children(vec![
                MenuNode::link("daily", "日报", "/reports/daily").requires("日报查看"),
            ]),
        ];
        let menu = resolve_visible_menu(&tree, &perms(&[]), &hides(&[]));
        assert_eq!(menu.len(), 1);
        assert!(menu[0].children.is_empty());
    }

    #[test]
    fn test_gate_does_not_cascade_to_children() {
        let tree = vec![
            MenuNode::container("ops", "运维")
                .requires("运维")
                .with_children(vec![
                    MenuNode::link("open", "公开页", "/ops/open"),
                    MenuNode::link("secret", "密钥", "/ops/secret").requires("密钥"),
                ]),
        ];

        let menu = resolve_visible_menu(&tree, &perms(&["运维"]), &hides(&[]));
        assert_eq!(collect_ids(&menu), ["ops", "open"]);

        // An ungated child under a denied parent goes with the parent.
        let menu = resolve_visible_menu(&tree, &perms(&["密钥"]), &hides(&[]));
        assert!(menu.is_empty());
    }

    #[test]
    fn test_hiding_a_container_removes_its_subtree() {
        let all = perms(&["用户管理", "角色管理", "菜单管理", "参数管理"]);
        let menu = resolve_visible_menu(&system_menu(), &all, &hides(&["system"]));
        for id in ["system", "user", "role", "permission", "param"] {
            assert!(find_in(&menu, id).is_none(), "{id} should be gone");
        }
        assert!(find_in(&menu, "dashboard").is_some());
    }

    #[test]
    fn test_idempotent_and_input_untouched() {
        let tree = system_menu();
        let before = tree.clone();
        let p = perms(&["业务管理", "角色管理"]);
        let h = hides(&["tag"]);

        let first = resolve_visible_menu(&tree, &p, &h);
        let second = resolve_visible_menu(&tree, &p, &h);
        assert_eq!(first, second);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_monotonic_in_permissions() {
        let tree = system_menu();
        let h = hides(&["demo"]);
        let smaller = perms(&["用户管理"]);
        let larger = perms(&["用户管理", "业务审核"]);

        let small_ids = collect_ids(&resolve_visible_menu(&tree, &smaller, &h));
        let large_ids = collect_ids(&resolve_visible_menu(&tree, &larger, &h));
        assert!(small_ids.iter().all(|id| large_ids.contains(id)));
        assert!(large_ids.len() > small_ids.len());
    }

    #[test]
    fn test_sibling_order_preserved() {
        let all = perms(&["业务管理"]);
        let menu = resolve_visible_menu(&system_menu(), &all, &hides(&["type", "ads"]));
        let business = find_in(&menu, "business").map(|n| &n.children);
        let ids: Vec<&str> = business
            .into_iter()
            .flatten()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, ["cert", "process", "message", "project-type", "tag"]);
    }

    #[test]
    fn test_unknown_requirements_reported() {
        let resolver = MenuVisibilityResolver::new(system_menu());
        let unknown = resolver.unknown_requirements(["用户管理", "角色管理", "菜单管理"]);
        assert!(unknown.iter().any(|(id, p)| id == "param" && p == "参数管理"));
        assert!(!unknown.iter().any(|(id, _)| id == "user"));
    }
}
