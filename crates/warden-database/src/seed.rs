//! Startup integrity seeding.
//!
//! Guarantees that the administrator role exists and holds the whole
//! permission catalog, and that the administrator user exists and holds
//! that role. Runs after migrations on every start.

use sqlx::PgPool;
use tracing::{info, warn};

use warden_core::result::AppResult;

use crate::repositories::map_db_error;

/// Names and credential used to bootstrap the administrator account.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    /// Name of the administrator role.
    pub role_name: String,
    /// Login name of the administrator user.
    pub user_name: String,
    /// Pre-hashed password used only when the user has to be created.
    pub password_hash: String,
}

/// What [`ensure_admin`] had to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// The administrator role was created.
    pub role_created: bool,
    /// Number of permissions newly granted to the role.
    pub permissions_granted: u64,
    /// The administrator user was created.
    pub user_created: bool,
    /// The role was newly assigned to the user.
    pub role_assigned: bool,
}

/// Bring the administrator role and user into a consistent state.
pub async fn ensure_admin(pool: &PgPool, admin: &AdminBootstrap) -> AppResult<SeedReport> {
    let mut report = SeedReport::default();
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| map_db_error("Failed to begin seed transaction", e))?;

    let existing_role: Option<i64> = sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
        .bind(&admin.role_name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to look up administrator role", e))?;

    let role_id = match existing_role {
        Some(id) => id,
        None => {
            report.role_created = true;
            sqlx::query_scalar("INSERT INTO roles (name) VALUES ($1) RETURNING id")
                .bind(&admin.role_name)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_db_error("Failed to create administrator role", e))?
        }
    };

    report.permissions_granted = sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id) \
         SELECT $1, id FROM permissions \
         ON CONFLICT DO NOTHING",
    )
    .bind(role_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| map_db_error("Failed to grant catalog to administrator role", e))?
    .rows_affected();

    let existing_user: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE name = $1")
        .bind(&admin.user_name)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to look up administrator user", e))?;

    let user_id = match existing_user {
        Some(id) => id,
        None => {
            report.user_created = true;
            sqlx::query_scalar(
                "INSERT INTO users (name, password_hash) VALUES ($1, $2) RETURNING id",
            )
            .bind(&admin.user_name)
            .bind(&admin.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_db_error("Failed to create administrator user", e))?
        }
    };

    report.role_assigned = sqlx::query(
        "INSERT INTO user_roles (user_id, role_id, position) \
         SELECT $1, $2, COALESCE(MAX(position), 0) + 1 FROM user_roles WHERE user_id = $1 \
         ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| map_db_error("Failed to assign administrator role", e))?
    .rows_affected()
        > 0;

    tx.commit()
        .await
        .map_err(|e| map_db_error("Failed to commit seed transaction", e))?;

    if report.user_created {
        warn!(
            user = %admin.user_name,
            "Administrator user created with the configured initial password; change it"
        );
    }
    info!(
        role = %admin.role_name,
        role_created = report.role_created,
        permissions_granted = report.permissions_granted,
        user_created = report.user_created,
        role_assigned = report.role_assigned,
        "Administrator integrity check complete"
    );

    Ok(report)
}
