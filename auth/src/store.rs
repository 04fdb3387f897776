//! Persistence seam for user records.
//!
//! The auth crate only needs four operations from a backend: find one user by
//! a query, find one by id, create, and save. [`MemoryUserStore`] is the
//! in-process implementation; the server ships a SQLite one.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::user::{NewUser, User};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User {0} does not exist")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Filter over user records
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserQuery {
    GoogleId(String),
    FacebookId(String),
    Username(String),
    /// Matches when any of the inner queries match
    AnyOf(Vec<UserQuery>),
}

impl UserQuery {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserQuery::GoogleId(id) => user.google_id.as_deref() == Some(id.as_str()),
            UserQuery::FacebookId(id) => user.facebook_id.as_deref() == Some(id.as_str()),
            UserQuery::Username(name) => user.username == *name,
            UserQuery::AnyOf(queries) => queries.iter().any(|q| q.matches(user)),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// First user matching the query, in insertion order
    async fn find_one(&self, query: &UserQuery) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Persist a new user under a freshly generated id
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Overwrite an existing user
    async fn save(&self, user: &User) -> Result<User, StoreError>;
}

pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// In-memory user store
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_one(&self, query: &UserQuery) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| query.matches(u)).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user = User {
            id: generate_user_id(),
            username: user.username,
            google_id: user.google_id,
            facebook_id: user.facebook_id,
        };
        self.users.write().await.push(user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| StoreError::NotFound(user.id.clone()))?;
        *slot = user.clone();
        Ok(user.clone())
    }
}
