//! Permission entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named capability, optionally nested under a parent permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Unique permission identifier.
    pub id: i64,
    /// Unique capability name, e.g. `添加用户`.
    pub name: String,
    /// Parent permission, `None` for a root.
    pub parent_id: Option<i64>,
}

impl Permission {
    /// Creates a permission row.
    pub fn new(id: i64, name: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }
}

/// Data required to add a permission to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermission {
    /// Capability name.
    pub name: String,
    /// Parent permission, if nested.
    pub parent_id: Option<i64>,
}
