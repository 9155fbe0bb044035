//! Postgres-backed user store.
//!
//! Uses runtime `sqlx::query` + `try_get` row mapping (no compile-time DB
//! connection needed). Every call checks out a pooled connection and returns
//! it when the future completes, on success and error paths alike.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use roster_core::{NewUser, User, UserId, UserPatch};

use super::{UserStore, UserStoreError};

/// Postgres user store.
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the `users` table exists. Called once at startup, before the
    /// server accepts traffic.
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), UserStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                age INTEGER,
                gender TEXT NOT NULL,
                house TEXT NOT NULL,
                blood_status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                deleted_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

fn map_user_row(row: &PgRow) -> Result<User, UserStoreError> {
    let parse = |col: &str| -> Result<String, UserStoreError> {
        row.try_get::<String, _>(col)
            .map_err(|e| UserStoreError::Storage(e.to_string()))
    };

    Ok(User {
        id: UserId(row.try_get::<i64, _>("id").map_err(sqlx_col)?),
        name: parse("name")?,
        email: parse("email")?,
        age: row.try_get::<Option<i32>, _>("age").map_err(sqlx_col)?,
        gender: parse("gender")?
            .parse()
            .map_err(|e: roster_core::DomainError| UserStoreError::Storage(e.to_string()))?,
        house: parse("house")?
            .parse()
            .map_err(|e: roster_core::DomainError| UserStoreError::Storage(e.to_string()))?,
        blood_status: parse("blood_status")?
            .parse()
            .map_err(|e: roster_core::DomainError| UserStoreError::Storage(e.to_string()))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(sqlx_col)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(sqlx_col)?,
        deleted_at: row
            .try_get::<Option<DateTime<Utc>>, _>("deleted_at")
            .map_err(sqlx_col)?,
    })
}

fn sqlx_col(err: sqlx::Error) -> UserStoreError {
    UserStoreError::Storage(err.to_string())
}

const USER_COLUMNS: &str =
    "id, name, email, age, gender, house, blood_status, created_at, updated_at, deleted_at";

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (name, email, age, gender, house, blood_status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .bind(user.gender.as_str())
        .bind(user.house.as_str())
        .bind(user.blood_status.as_str())
        .fetch_one(&self.pool)
        .await?;

        map_user_row(&row)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, UserStoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<User>, UserStoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL \
             ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(i64::from(offset))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_user_row).collect()
    }

    async fn soft_delete(&self, id: UserId) -> Result<(), UserStoreError> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserStoreError::NotFound);
        }
        Ok(())
    }

    async fn apply_patch(&self, id: UserId, patch: &UserPatch) -> Result<User, UserStoreError> {
        // Read-modify-write; concurrent patches to the same row are
        // last-write-wins, per the store contract.
        let mut user = self.get(id).await?.ok_or(UserStoreError::NotFound)?;
        patch.apply_to(&mut user);
        let updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET name = $1, email = $2, age = $3, gender = $4, \
             house = $5, blood_status = $6, updated_at = $7 \
             WHERE id = $8 AND deleted_at IS NULL",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .bind(user.gender.as_str())
        .bind(user.house.as_str())
        .bind(user.blood_status.as_str())
        .bind(updated_at)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        // The row may have been tombstoned between the read and the write.
        if result.rows_affected() == 0 {
            return Err(UserStoreError::NotFound);
        }

        user.updated_at = updated_at;
        Ok(user)
    }
}
