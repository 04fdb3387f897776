//! SocialGate Authentication Library
//!
//! Google and Facebook sign-in for axum applications. A provider profile is
//! reconciled with a local user record (found by provider id, or created), and
//! the user id is kept in a server-side session referenced by a private cookie.
//!
//! # Features
//!
//! - OAuth2 authorization code flow with PKCE and CSRF state checks
//! - Profile reconciliation against a pluggable [`UserStore`]
//! - Session management with configurable timeouts
//! - Middleware for protecting routes
//! - Configurable via TOML configuration files
//!
//! # Example
//!
//! ```no_run
//! use socialgate_auth::{AuthConfig, AuthService, AuthState, MemoryUserStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AuthConfig::default();
//!     let store = Arc::new(MemoryUserStore::new());
//!     let auth_service = Arc::new(AuthService::new(config, store).await.unwrap());
//!     let auth_state = AuthState::new(auth_service);
//!     // Use auth_state in your application
//! }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod providers;
pub mod reconcile;
pub mod routes;
pub mod service;
pub mod session;
pub mod store;
pub mod user;
pub mod views;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use std::ops::Deref;
use std::sync::Arc;

// Re-export commonly used types
pub use config::AuthConfig;
pub use error::AuthError;
pub use middleware::{optional_auth, require_auth};
pub use reconcile::reconcile;
pub use routes::auth_routes;
pub use service::AuthService;
pub use session::{OAuthTempState, SessionData};
pub use store::{MemoryUserStore, StoreError, UserQuery, UserStore};
pub use user::{ExternalProfile, NewUser, Provider, User};

/// State wrapper for AuthService that implements FromRef for Key
/// This allows PrivateCookieJar to extract the cookie key from state
#[derive(Clone)]
pub struct AuthState {
    inner: Arc<AuthService>,
}

impl AuthState {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self {
            inner: auth_service,
        }
    }
}

impl Deref for AuthState {
    type Target = AuthService;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<Arc<AuthService>> for AuthState {
    fn from(service: Arc<AuthService>) -> Self {
        Self::new(service)
    }
}

/// Implement FromRef to allow PrivateCookieJar to extract Key from AuthState
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key()
    }
}
