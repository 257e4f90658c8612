//! User repository with ordered role assignments.

use sqlx::{FromRow, PgPool, Postgres, Transaction};

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_entity::user::{CreateUser, User, UserCredentials};

use super::{map_db_error, violated_constraint};

const USER_WITH_ROLES: &str = "SELECT u.id, u.name, r.id AS role_id, r.name AS role_name \
     FROM users u \
     LEFT JOIN user_roles ur ON ur.user_id = u.id \
     LEFT JOIN roles r ON r.id = ur.role_id";

#[derive(Debug, FromRow)]
struct UserRoleRow {
    id: i64,
    name: String,
    role_id: Option<i64>,
    role_name: Option<String>,
}

/// Repository for users and their role assignments.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every user, newest first, with roles in assignment order.
    pub async fn find_all(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRoleRow>(&format!(
            "{USER_WITH_ROLES} ORDER BY u.id DESC, ur.position"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list users", e))?;

        Ok(group_users(rows))
    }

    /// Find a user by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let rows = sqlx::query_as::<_, UserRoleRow>(&format!(
            "{USER_WITH_ROLES} WHERE u.id = $1 ORDER BY ur.position"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to find user by id", e))?;

        Ok(group_users(rows).into_iter().next())
    }

    /// Load the stored credential row for a login name.
    pub async fn find_credentials_by_name(&self, name: &str) -> AppResult<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, name, password_hash FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to load user credentials", e))
    }

    /// Role ids held by a user, in assignment order.
    pub async fn role_ids_for_user(&self, user_id: i64) -> AppResult<Vec<i64>> {
        sqlx::query_scalar(
            "SELECT role_id FROM user_roles WHERE user_id = $1 ORDER BY position",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to load user roles", e))
    }

    /// Create a user with its initial role list in one transaction.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut tx = self.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (name, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(&data.name)
        .bind(&data.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, &data.name, "Failed to create user"))?;

        insert_roles(&mut tx, id, &data.role_ids).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit user creation", e))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal(format!("User {id} vanished after creation")))
    }

    /// Replace a user's role list wholesale.
    pub async fn replace_roles(&self, user_id: i64, role_ids: &[i64]) -> AppResult<()> {
        let mut tx = self.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_db_error("Failed to find user", e))?;
        if exists.is_none() {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("Failed to clear user roles", e))?;

        insert_roles(&mut tx, user_id, role_ids).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit role replacement", e))
    }

    /// Delete a user. Role links cascade.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to delete user", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {id} not found")));
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

async fn insert_roles(
    tx: &mut Transaction<'static, Postgres>,
    user_id: i64,
    role_ids: &[i64],
) -> AppResult<()> {
    if role_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id, position) \
         SELECT $1, role_id, ord FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS t(role_id, ord) \
         ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_ids)
    .execute(&mut **tx)
    .await
    .map_err(|e| match violated_constraint(&e) {
        Some("user_roles_role_id_fkey") => {
            AppError::validation(format!("Unknown role in {role_ids:?}"))
        }
        _ => map_db_error("Failed to assign user roles", e),
    })?;

    Ok(())
}

fn write_error(err: sqlx::Error, name: &str, context: &str) -> AppError {
    if violated_constraint(&err) == Some("users_name_key") {
        AppError::conflict(format!("User '{name}' already exists"))
    } else {
        map_db_error(context, err)
    }
}

fn group_users(rows: Vec<UserRoleRow>) -> Vec<User> {
    let mut users: Vec<User> = Vec::new();
    for row in rows {
        let idx = match users.iter().position(|u| u.id == row.id) {
            Some(idx) => idx,
            None => {
                users.push(User {
                    id: row.id,
                    name: row.name,
                    role_ids: Vec::new(),
                    role_names: Vec::new(),
                });
                users.len() - 1
            }
        };
        if let (Some(role_id), Some(role_name)) = (row.role_id, row.role_name) {
            users[idx].role_ids.push(role_id);
            users[idx].role_names.push(role_name);
        }
    }
    users
}
