//! Menu definition and per-caller resolution.

use std::sync::Arc;

use warden_auth::menu::MenuVisibilityResolver;
use warden_entity::menu::{LocalHideSet, MenuNode};
use warden_entity::permission::PermissionTree;

use crate::context::RequestContext;

/// Serves the static menu and resolves it for a caller.
#[derive(Debug, Clone)]
pub struct MenuService {
    resolver: Arc<MenuVisibilityResolver>,
}

impl MenuService {
    /// Creates a new menu service.
    pub fn new(resolver: Arc<MenuVisibilityResolver>) -> Self {
        Self { resolver }
    }

    /// The unfiltered definition with requirement annotations.
    pub fn definition(&self) -> &[MenuNode] {
        self.resolver.definition()
    }

    /// The caller's visible menu with `hidden` applied.
    pub fn resolve(&self, ctx: &RequestContext, hidden: &LocalHideSet) -> Vec<MenuNode> {
        self.resolver.resolve(&ctx.permissions, hidden)
    }

    /// Menu entries gated on a permission `catalog` does not contain, as
    /// `(node id, permission name)`. Each one is logged; those entries stay
    /// hidden for everyone.
    pub fn audit_catalog(&self, catalog: &PermissionTree) -> Vec<(String, String)> {
        self.resolver.unknown_requirements(catalog.names())
    }
}

#[cfg(test)]
mod tests {
    use warden_auth::menu::system_menu;
    use warden_auth::rbac::PermissionSet;
    use warden_entity::menu::node::find_in;
    use warden_entity::permission::Permission;

    use super::*;

    #[test]
    fn test_resolves_for_caller() {
        let service = MenuService::new(Arc::new(MenuVisibilityResolver::new(system_menu())));
        let perms: PermissionSet = ["业务审核"].into_iter().collect();
        let ctx = RequestContext::new(3, "auditor", vec![4], perms);

        let hidden: LocalHideSet = ["advertisement"].into_iter().collect();
        let menu = service.resolve(&ctx, &hidden);

        assert!(find_in(&menu, "real-name").is_some());
        assert!(find_in(&menu, "advertisement").is_none());
        assert!(find_in(&menu, "business").is_none());
        assert!(find_in(service.definition(), "business").is_some());
    }

    #[test]
    fn test_audit_reports_gates_missing_from_catalog() {
        let service = MenuService::new(Arc::new(MenuVisibilityResolver::new(system_menu())));
        let catalog = PermissionTree::from_flat(vec![
            Permission::new(1, "用户管理", None),
            Permission::new(2, "角色管理", None),
            Permission::new(3, "菜单管理", None),
            Permission::new(4, "参数管理", None),
            Permission::new(5, "业务管理", None),
        ])
        .unwrap();

        let gaps = service.audit_catalog(&catalog);
        let ids: Vec<&str> = gaps.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["real-name", "advertisement", "project"]);
        assert!(gaps.iter().all(|(_, permission)| permission == "业务审核"));
    }
}
