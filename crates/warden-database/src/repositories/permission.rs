//! Permission catalog repository.

use sqlx::PgPool;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_entity::permission::{CreatePermission, Permission, PermissionTree};

use super::{map_db_error, violated_constraint};

/// Repository for the permission catalog.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every permission ordered by id.
    pub async fn find_all(&self) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT id, name, parent_id FROM permissions ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to list permissions", e))
    }

    /// Load the catalog as a validated tree.
    pub async fn load_tree(&self) -> AppResult<PermissionTree> {
        PermissionTree::from_flat(self.find_all().await?)
    }

    /// Find a permission by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT id, name, parent_id FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to find permission by id", e))
    }

    /// Find a permission by exact name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, parent_id FROM permissions WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to find permission by name", e))
    }

    /// Add a permission and grant it to the administrator role in the same
    /// transaction, so that role keeps holding the whole catalog.
    pub async fn create(
        &self,
        data: &CreatePermission,
        admin_role_name: &str,
    ) -> AppResult<Permission> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let permission = sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (name, parent_id) VALUES ($1, $2) \
             RETURNING id, name, parent_id",
        )
        .bind(&data.name)
        .bind(data.parent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some("permissions_name_key") => {
                AppError::conflict(format!("Permission '{}' already exists", data.name))
            }
            Some("permissions_parent_id_fkey") => AppError::validation(format!(
                "Parent permission {:?} does not exist",
                data.parent_id
            )),
            _ => map_db_error("Failed to create permission", e),
        })?;

        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id) \
             SELECT id, $1 FROM roles WHERE name = $2 \
             ON CONFLICT DO NOTHING",
        )
        .bind(permission.id)
        .bind(admin_role_name)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to grant permission to administrator role", e))?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit permission creation", e))?;

        Ok(permission)
    }

    /// Delete a leaf permission. Nodes with children are refused.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let children: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM permissions WHERE parent_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_db_error("Failed to count child permissions", e))?;

        if children > 0 {
            return Err(AppError::conflict(format!(
                "Permission {id} still has {children} child permission(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete permission", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Permission {id} not found")));
        }
        Ok(())
    }
}
