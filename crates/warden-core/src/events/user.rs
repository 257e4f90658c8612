//! User-related domain events.

use serde::{Deserialize, Serialize};

/// Events related to user administration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UserEvent {
    /// A new user was created.
    Created {
        /// The user ID.
        user_id: i64,
        /// The user name.
        name: String,
        /// Roles assigned at creation.
        role_ids: Vec<i64>,
    },
    /// A user's role list was replaced wholesale.
    RolesReplaced {
        /// The user ID.
        user_id: i64,
        /// The new role list.
        role_ids: Vec<i64>,
    },
    /// A user was deleted.
    Deleted {
        /// The user ID.
        user_id: i64,
    },
}
