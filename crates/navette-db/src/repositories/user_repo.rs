//! User repository implementation
//!
//! Provides PostgreSQL-backed storage for back-office accounts.

use async_trait::async_trait;
use navette_core::{
    models::User,
    traits::{Repository, UserRepository},
    AppError, AppResult,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, error, instrument};

const USER_COLUMNS: &str = r#"
    id, username, password_hash, email, is_admin, active,
    last_login, created_at, updated_at
"#;

/// PostgreSQL implementation of UserRepository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> User {
        User {
            id: row.get("id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            email: row.get("email"),
            is_admin: row.get("is_admin"),
            active: row.get("active"),
            last_login: row.get("last_login"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl Repository<User, i32> for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        debug!("Finding user by id: {}", id);

        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query(&query)
            .bind(id)
            .map(Self::map_row)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding user {}: {}", id, e);
                AppError::Database(format!("Failed to find user: {}", e))
            })
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users ORDER BY id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );
        sqlx::query(&query)
            .bind(limit)
            .bind(offset)
            .map(Self::map_row)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding users: {}", e);
                AppError::Database(format!("Failed to fetch users: {}", e))
            })
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting users: {}", e);
                AppError::Database(format!("Failed to count users: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &User) -> AppResult<User> {
        debug!("Creating user: {}", entity.username);

        let query = format!(
            r#"
            INSERT INTO users (username, password_hash, email, is_admin, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query(&query)
            .bind(&entity.username)
            .bind(&entity.password_hash)
            .bind(&entity.email)
            .bind(entity.is_admin)
            .bind(entity.active)
            .map(Self::map_row)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating user: {}", e);
                if e.to_string().contains("unique constraint") {
                    AppError::Conflict(format!("User {} already exists", entity.username))
                } else {
                    AppError::Database(format!("Failed to create user: {}", e))
                }
            })
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &User) -> AppResult<User> {
        debug!("Updating user: {}", entity.id);

        let query = format!(
            r#"
            UPDATE users
            SET username = $2,
                password_hash = $3,
                email = $4,
                is_admin = $5,
                active = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query(&query)
            .bind(entity.id)
            .bind(&entity.username)
            .bind(&entity.password_hash)
            .bind(&entity.email)
            .bind(entity.is_admin)
            .bind(entity.active)
            .map(Self::map_row)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating user {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update user: {}", e))
            })?
            .ok_or_else(|| AppError::UserNotFound(entity.id.to_string()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting user {}: {}", id, e);
                AppError::Database(format!("Failed to delete user: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        debug!("Finding user by username: {}", username);

        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        sqlx::query(&query)
            .bind(username)
            .map(Self::map_row)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding user by username: {}", e);
                AppError::Database(format!("Failed to find user: {}", e))
            })
    }

    #[instrument(skip(self))]
    async fn update_last_login(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating last login for user {}: {}", id, e);
                AppError::Database(format!("Failed to update last login: {}", e))
            })?;

        Ok(())
    }
}
