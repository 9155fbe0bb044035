//! In-memory user store for tests/dev.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use roster_core::{NewUser, User, UserId, UserPatch};

use super::{UserStore, UserStoreError};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

/// In-memory user store.
///
/// A `BTreeMap` keyed by id keeps iteration in insertion order, matching the
/// stable-paging contract of the Postgres implementation.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError> {
        let mut inner = self.inner.write().unwrap();
        inner.next_id += 1;
        let now = Utc::now();
        let row = User {
            id: UserId(inner.next_id),
            name: user.name,
            email: user.email,
            age: user.age,
            gender: user.gender,
            house: user.house,
            blood_status: user.blood_status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.rows.insert(row.id.0, row.clone());
        Ok(row)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, UserStoreError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.rows.get(&id.0).filter(|u| u.is_live()).cloned())
    }

    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<User>, UserStoreError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .rows
            .values()
            .filter(|u| u.is_live())
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: UserId) -> Result<(), UserStoreError> {
        let mut inner = self.inner.write().unwrap();
        match inner.rows.get_mut(&id.0) {
            Some(row) if row.is_live() => {
                row.deleted_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(UserStoreError::NotFound),
        }
    }

    async fn apply_patch(&self, id: UserId, patch: &UserPatch) -> Result<User, UserStoreError> {
        let mut inner = self.inner.write().unwrap();
        match inner.rows.get_mut(&id.0) {
            Some(row) if row.is_live() => {
                patch.apply_to(row);
                row.updated_at = Utc::now();
                Ok(row.clone())
            }
            _ => Err(UserStoreError::NotFound),
        }
    }
}
