//! Effective-permission evaluation.
//!
//! A user's effective permissions are the union of the permission names of
//! every role they hold. Names are opaque and case-sensitive; granting a
//! parent permission never implies its children.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use warden_entity::role::Role;

/// The set of permission names an identity holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    /// An empty set. Every check against it is false.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the named permission is held. Exact, case-sensitive match.
    pub fn has(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// Number of distinct permission names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether every name in `other` is also in `self`.
    pub fn is_superset(&self, other: &PermissionSet) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Sorted list of names, for serialization into responses.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Union of the permission names of every given role.
pub fn effective_permissions<'a>(roles: impl IntoIterator<Item = &'a Role>) -> PermissionSet {
    roles
        .into_iter()
        .flat_map(|role| role.permission_names.iter().cloned())
        .collect()
}

/// Computes effective permissions from a user's role ids, tolerating
/// dangling references.
///
/// Role ids with no matching role contribute nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationEvaluator;

impl AuthorizationEvaluator {
    /// Creates an evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Effective permissions for a user holding `role_ids`, given the roles
    /// that could be loaded.
    pub fn evaluate(&self, role_ids: &[i64], roles: &[Role]) -> PermissionSet {
        let mut granted = BTreeSet::new();

        for role_id in role_ids {
            let Some(role) = roles.iter().find(|r| r.id == *role_id) else {
                warn!(role_id, "Assigned role not found; contributing no permissions");
                continue;
            };
            granted.extend(role.permission_names.iter().cloned());
        }

        PermissionSet(granted)
    }
}
