//! Session-related domain events.

use serde::{Deserialize, Serialize};

/// Events related to session issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A user authenticated with their own credential.
    Opened {
        /// The user ID.
        user_id: i64,
        /// The user name.
        name: String,
    },
    /// An administrator obtained a session for another user.
    Impersonated {
        /// The administrator's user ID.
        admin_id: i64,
        /// The impersonated user ID.
        target_id: i64,
    },
    /// A login attempt was rejected.
    Rejected {
        /// The submitted name.
        name: String,
    },
}
