//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Authentication, bearer token, and administrator bootstrap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Bearer token lifetime in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
    /// Name of the protected administrator role.
    #[serde(default = "default_admin_role")]
    pub admin_role_name: String,
    /// Name of the bootstrap administrator account.
    #[serde(default = "default_admin_user")]
    pub admin_user_name: String,
    /// Password given to the bootstrap administrator when it is first created.
    #[serde(default = "default_admin_password")]
    pub admin_initial_password: String,
    /// Minimum password length for new accounts.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_minutes: default_token_ttl(),
            admin_role_name: default_admin_role(),
            admin_user_name: default_admin_user(),
            admin_initial_password: default_admin_password(),
            password_min_length: default_password_min(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_token_ttl() -> u64 {
    480
}

fn default_admin_role() -> String {
    "管理员".to_string()
}

fn default_admin_user() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "password".to_string()
}

fn default_password_min() -> usize {
    6
}
