//! # warden-auth
//!
//! Authorization and session handling for the Warden RBAC console.
//!
//! ## Modules
//!
//! - `rbac`: effective-permission evaluation (union across roles) and capability gates
//! - `menu`: static menu definition, visibility resolution, personal hide store
//! - `session`: console session state machine and its collaborators
//! - `provider`: database-backed authentication check and role directory
//! - `password`: Argon2id hashing and password policy
//! - `jwt`: bearer token encoding and validation

pub mod jwt;
pub mod menu;
pub mod password;
pub mod provider;
pub mod rbac;
pub mod session;

pub use jwt::{Claims, TokenCodec};
pub use menu::{LocalHideStore, MenuProjector, MenuVisibilityResolver};
pub use password::{PasswordHasher, PasswordPolicy};
pub use rbac::{AuthorizationEvaluator, Capability, PermissionSet, RbacEnforcer};
pub use session::{
    Authenticator, RoleDirectory, SessionManager, SessionSnapshot, SessionState, SignIn,
};
pub use provider::{DatabaseAuthenticator, RepositoryRoleDirectory};
