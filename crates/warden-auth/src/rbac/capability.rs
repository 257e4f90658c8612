//! Capability catalog: one canonical permission name per guarded action.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An action the console guards, bound to exactly one permission name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // User management
    /// List and view users.
    UserRead,
    /// Create users.
    UserCreate,
    /// Change a user's role list.
    UserUpdate,
    /// Delete users.
    UserDelete,
    /// Full user administration, including impersonation.
    UserManage,

    // Role management
    /// List and view roles.
    RoleRead,
    /// Create roles.
    RoleCreate,
    /// Edit and delete roles.
    RoleManage,

    // Catalog and system
    /// Maintain the permission tree.
    MenuManage,
    /// Maintain system parameters.
    ParamManage,

    // Business
    /// Business data maintenance.
    BusinessManage,
    /// Business review queues.
    BusinessAudit,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 12] = [
        Self::UserRead,
        Self::UserCreate,
        Self::UserUpdate,
        Self::UserDelete,
        Self::UserManage,
        Self::RoleRead,
        Self::RoleCreate,
        Self::RoleManage,
        Self::MenuManage,
        Self::ParamManage,
        Self::BusinessManage,
        Self::BusinessAudit,
    ];

    /// The permission name that grants this capability.
    pub fn permission_name(self) -> &'static str {
        match self {
            Self::UserRead => "查询用户",
            Self::UserCreate => "添加用户",
            Self::UserUpdate => "修改用户",
            Self::UserDelete => "删除用户",
            Self::UserManage => "用户管理",
            Self::RoleRead => "查询角色",
            Self::RoleCreate => "添加角色",
            Self::RoleManage => "角色管理",
            Self::MenuManage => "菜单管理",
            Self::ParamManage => "参数管理",
            Self::BusinessManage => "业务管理",
            Self::BusinessAudit => "业务审核",
        }
    }

    /// Reverse lookup from a permission name.
    pub fn from_permission_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.permission_name() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.permission_name())
    }
}
