//! The console's static navigation tree.
//!
//! Containers carry no gate of their own. Every page under them is gated, and
//! a container whose pages are all denied is pruned at resolution time.

use warden_entity::menu::MenuNode;

use crate::rbac::Capability;

fn gated(id: &str, label: &str, path: &str, capability: Capability) -> MenuNode {
    MenuNode::link(id, label, path).requires(capability.permission_name())
}

/// Builds the navigation tree shown by the console.
pub fn system_menu() -> Vec<MenuNode> {
    vec![
        MenuNode::link("dashboard", "首页概览", "/"),
        MenuNode::container("system", "系统管理").with_children(vec![
            gated("user", "用户管理", "/users", Capability::UserManage),
            gated("role", "角色管理", "/roles", Capability::RoleManage),
            gated("permission", "菜单管理", "/permissions", Capability::MenuManage),
            gated("param", "参数管理", "/params", Capability::ParamManage),
        ]),
        MenuNode::container("business", "业务管理").with_children(
            [
                ("cert", "资质维护"),
                ("type", "分类管理"),
                ("process", "流程管理"),
                ("ads", "广告管理"),
                ("message", "消息模板"),
                ("project-type", "项目分类"),
                ("tag", "项目标签"),
            ]
            .into_iter()
            .map(|(id, label)| {
                gated(id, label, &format!("/business/{id}"), Capability::BusinessManage)
            })
            .collect(),
        ),
        MenuNode::container("audit", "业务审核").with_children(
            [
                ("real-name", "实名认证审核"),
                ("advertisement", "广告审核"),
                ("project", "项目审核"),
            ]
            .into_iter()
            .map(|(id, label)| gated(id, label, &format!("/audit/{id}"), Capability::BusinessAudit))
            .collect(),
        ),
        MenuNode::link("demo", "操作演示", "/demo"),
    ]
}
