//! Repository implementations for Warden entities.

pub mod permission;
pub mod role;
pub mod user;

pub use permission::PermissionRepository;
pub use role::RoleRepository;
pub use user::UserRepository;

use warden_core::error::{AppError, ErrorKind};

/// Maps a sqlx failure into an `AppError`.
///
/// Pool exhaustion and transport failures become `ServiceUnavailable`;
/// everything else stays a `Database` error carrying `context`.
pub(crate) fn map_db_error(context: &str, err: sqlx::Error) -> AppError {
    let kind = match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            ErrorKind::ServiceUnavailable
        }
        _ => ErrorKind::Database,
    };
    AppError::with_source(kind, format!("{context}: {err}"), err)
}

/// Name of the violated constraint, if the error is a constraint violation.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}
