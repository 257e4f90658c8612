//! Authenticated identity as returned by the authentication check.

use serde::{Deserialize, Serialize};

/// Who is logged in, and which roles they held when authentication succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// User ID.
    pub id: i64,
    /// Unique login name.
    pub name: String,
    /// Assigned role IDs, in assignment order.
    #[serde(default)]
    pub role_ids: Vec<i64>,
}

impl Identity {
    /// Creates an identity snapshot.
    pub fn new(id: i64, name: impl Into<String>, role_ids: Vec<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            role_ids,
        }
    }
}
