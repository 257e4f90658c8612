//! Role entity model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named bundle of permission names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role identifier.
    pub id: i64,
    /// Unique role name.
    pub name: String,
    /// Names of the granted permissions.
    #[serde(rename = "permissions", default)]
    pub permission_names: BTreeSet<String>,
}

impl Role {
    /// Creates a role from any iterable of permission names.
    pub fn new<I, S>(id: i64, name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            name: name.into(),
            permission_names: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this role grants the named permission.
    pub fn grants(&self, permission: &str) -> bool {
        self.permission_names.contains(permission)
    }
}

/// A `roles` table row without its permission links.
#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    /// Role ID.
    pub id: i64,
    /// Role name.
    pub name: String,
}

/// Data for creating or replacing a role.
#[derive(Debug, Clone, Default)]
pub struct RoleDraft {
    /// Role name.
    pub name: String,
    /// The complete permission set the role should hold afterwards.
    pub permission_names: BTreeSet<String>,
}

/// Result of writing a role: the stored role plus any permission names that
/// did not resolve to a catalog entry and were therefore not linked.
#[derive(Debug, Clone)]
pub struct RoleWrite {
    /// The role as stored.
    pub role: Role,
    /// Submitted names with no matching permission.
    pub unresolved: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grants_is_exact_and_case_sensitive() {
        let role = Role::new(1, "Editor", ["添加用户", "Report"]);
        assert!(role.grants("添加用户"));
        assert!(!role.grants("report"));
        assert!(!role.grants("用户"));
    }

    #[test]
    fn test_serializes_permissions_field() {
        let role = Role::new(2, "Viewer", ["查询用户"]);
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["permissions"], serde_json::json!(["查询用户"]));
    }
}
