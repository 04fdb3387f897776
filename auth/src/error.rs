use thiserror::Error;
use axum::http::StatusCode;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("User store error: {0}")]
    Store(#[from] StoreError),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("OAuth error: {0}")]
    OAuthError(String),

    #[error("Provider not enabled: {0}")]
    ProviderDisabled(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<AuthError> for StatusCode {
    fn from(error: AuthError) -> StatusCode {
        match error {
            AuthError::AuthenticationRequired
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::UserNotFound(_)
            | AuthError::StateMismatch => StatusCode::UNAUTHORIZED,
            AuthError::ProviderDisabled(_) => StatusCode::NOT_FOUND,
            AuthError::NetworkError(_)
            | AuthError::JsonError(_)
            | AuthError::UrlError(_)
            | AuthError::Store(_)
            | AuthError::OAuthError(_)
            | AuthError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
