//! Role repository with wholesale permission-set replacement.

use std::collections::BTreeSet;

use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::warn;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_entity::role::{Role, RoleDraft, RoleRow, RoleWrite};

use super::{map_db_error, violated_constraint};

const ROLE_WITH_PERMISSIONS: &str = "SELECT r.id, r.name, p.name AS permission_name \
     FROM roles r \
     LEFT JOIN role_permissions rp ON rp.role_id = r.id \
     LEFT JOIN permissions p ON p.id = rp.permission_id";

/// One joined row: a role plus at most one of its permission names.
#[derive(Debug, FromRow)]
struct RolePermissionRow {
    id: i64,
    name: String,
    permission_name: Option<String>,
}

/// Repository for roles and their permission links.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every role with its permission names, ordered by id.
    pub async fn find_all(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(&format!(
            "{ROLE_WITH_PERMISSIONS} ORDER BY r.id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list roles", e))?;

        Ok(group_roles(rows))
    }

    /// Find a role by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Role>> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(&format!(
            "{ROLE_WITH_PERMISSIONS} WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to find role by id", e))?;

        Ok(group_roles(rows).into_iter().next())
    }

    /// Find several roles by id. Unknown ids are simply absent from the result.
    pub async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RolePermissionRow>(&format!(
            "{ROLE_WITH_PERMISSIONS} WHERE r.id = ANY($1) ORDER BY r.id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to find roles by ids", e))?;

        Ok(group_roles(rows))
    }

    /// Find a role row by exact name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<RoleRow>> {
        sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find role by name", e))
    }

    /// Create a role and link its permissions in one transaction.
    pub async fn create(&self, draft: &RoleDraft) -> AppResult<RoleWrite> {
        let mut tx = self.begin().await?;

        let id: i64 = sqlx::query_scalar("INSERT INTO roles (name) VALUES ($1) RETURNING id")
            .bind(&draft.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| name_conflict_or_db(e, &draft.name, "Failed to create role"))?;

        let write = link_permissions(&mut tx, id, draft).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit role creation", e))?;

        Ok(write)
    }

    /// Rename a role and replace its entire permission set: delete every
    /// existing link, then insert the new ones, all in one transaction.
    pub async fn update(&self, id: i64, draft: &RoleDraft) -> AppResult<RoleWrite> {
        let mut tx = self.begin().await?;

        let result = sqlx::query("UPDATE roles SET name = $1 WHERE id = $2")
            .bind(&draft.name)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| name_conflict_or_db(e, &draft.name, "Failed to update role"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Role {id} not found")));
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("Failed to clear role permissions", e))?;

        let write = link_permissions(&mut tx, id, draft).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit role update", e))?;

        Ok(write)
    }

    /// Delete a role. User and permission links cascade.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete role", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Role {id} not found")));
        }
        Ok(())
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))
    }
}

/// Insert links for every draft name that resolves; report the rest.
async fn link_permissions(
    tx: &mut Transaction<'static, Postgres>,
    role_id: i64,
    draft: &RoleDraft,
) -> AppResult<RoleWrite> {
    let requested: Vec<String> = draft.permission_names.iter().cloned().collect();

    let resolved: Vec<String> = sqlx::query_scalar(
        "WITH linked AS ( \
             INSERT INTO role_permissions (role_id, permission_id) \
             SELECT $1, id FROM permissions WHERE name = ANY($2) \
             RETURNING permission_id \
         ) \
         SELECT p.name FROM linked JOIN permissions p ON p.id = linked.permission_id",
    )
    .bind(role_id)
    .bind(&requested)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_db_error("Failed to link role permissions", e))?;

    let resolved: BTreeSet<String> = resolved.into_iter().collect();
    let unresolved: Vec<String> = requested
        .into_iter()
        .filter(|name| !resolved.contains(name))
        .collect();

    if !unresolved.is_empty() {
        warn!(
            role_id,
            unresolved = ?unresolved,
            "Role submitted permission names missing from the catalog"
        );
    }

    Ok(RoleWrite {
        role: Role {
            id: role_id,
            name: draft.name.clone(),
            permission_names: resolved,
        },
        unresolved,
    })
}

fn name_conflict_or_db(err: sqlx::Error, name: &str, context: &str) -> AppError {
    if violated_constraint(&err) == Some("roles_name_key") {
        AppError::conflict(format!("Role '{name}' already exists"))
    } else {
        map_db_error(context, err)
    }
}

/// Folds joined rows into roles, keeping first-seen role order.
fn group_roles(rows: Vec<RolePermissionRow>) -> Vec<Role> {
    let mut roles: Vec<Role> = Vec::new();
    for row in rows {
        let idx = match roles.iter().position(|r| r.id == row.id) {
            Some(idx) => idx,
            None => {
                roles.push(Role {
                    id: row.id,
                    name: row.name,
                    permission_names: BTreeSet::new(),
                });
                roles.len() - 1
            }
        };
        if let Some(permission) = row.permission_name {
            roles[idx].permission_names.insert(permission);
        }
    }
    roles
}
