//! Role-related domain events.

use serde::{Deserialize, Serialize};

/// Events related to role administration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoleEvent {
    /// A new role was created.
    Created {
        /// The role ID.
        role_id: i64,
        /// The role name.
        name: String,
    },
    /// A role's permission set was replaced wholesale.
    PermissionsReplaced {
        /// The role ID.
        role_id: i64,
        /// The role name after the update.
        name: String,
        /// Number of permissions now held.
        permission_count: usize,
    },
    /// A role was deleted.
    Deleted {
        /// The role ID.
        role_id: i64,
        /// The role name.
        name: String,
    },
}
