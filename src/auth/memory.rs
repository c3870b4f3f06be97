//! In-process `UserStore` used by handler tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    calls: AtomicUsize,
}

impl MemoryUserStore {
    /// Number of insert/lookup calls the store has served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().map(|u| u.len()).unwrap_or(0)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser<'_>) -> Result<User, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().expect("store lock");
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Duplicate);
        }
        let row = User {
            id: Uuid::new_v4(),
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            password_hash: user.password_hash.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().expect("store lock");
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn close(&self) {}
}

/// Fails every call the way an unreachable database would.
pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn insert(&self, _user: NewUser<'_>) -> Result<User, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn close(&self) {}
}
