//! Record store: the single owner of user rows.
//!
//! All read/list/delete/update paths see **live** rows only (rows whose
//! `deleted_at` is unset). Deletion is a tombstone timestamp; a deleted id
//! never again satisfies a lookup through this interface.

use async_trait::async_trait;

use roster_core::{NewUser, User, UserId, UserPatch};

mod in_memory;
mod postgres;

pub use in_memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;

/// Record store error.
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    /// No live record with the given id.
    #[error("user not found")]
    NotFound,
    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for UserStoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Store abstraction over user rows.
///
/// Each call acquires its own scoped connection (or lock scope) and releases
/// it on every exit path; no session is shared across concurrent requests.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new live row; the store assigns the id and both timestamps.
    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError>;

    /// Fetch a live record by id.
    async fn get(&self, id: UserId) -> Result<Option<User>, UserStoreError>;

    /// List live records in insertion (id) order, for stable paging.
    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<User>, UserStoreError>;

    /// Tombstone a live row. Repeat deletes of the same id fail `NotFound`,
    /// never succeed silently.
    async fn soft_delete(&self, id: UserId) -> Result<(), UserStoreError>;

    /// Merge the explicitly-present patch fields onto a live row, refresh
    /// `updated_at`, and return the final snapshot.
    ///
    /// Concurrent patches against the same id are last-write-wins at this
    /// layer; there is no per-record locking.
    async fn apply_patch(&self, id: UserId, patch: &UserPatch) -> Result<User, UserStoreError>;
}
