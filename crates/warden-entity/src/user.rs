//! User entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A console user together with its role assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Unique login name.
    pub name: String,
    /// Assigned role IDs, in assignment order.
    pub role_ids: Vec<i64>,
    /// Names of the assigned roles, parallel to `role_ids`.
    pub role_names: Vec<String>,
}

/// Stored credential row used by the authentication check.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    /// User ID.
    pub id: i64,
    /// Login name.
    pub name: String,
    /// Argon2 password hash.
    pub password_hash: String,
}

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Desired login name.
    pub name: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Initial role assignment.
    pub role_ids: Vec<i64>,
}
