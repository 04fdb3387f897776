use serde::{Deserialize, Serialize};

use crate::user::{Provider, User};

/// How long a login attempt may sit between redirect and callback
pub const OAUTH_STATE_TTL_SECS: u64 = 600;

/// Server-side session for a signed-in user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionData {
    /// Serialized user (the local user id)
    pub user_id: String,

    /// Username at sign-in time, for display only
    pub username: String,

    /// Provider used for this sign-in
    pub auth_provider: Provider,

    /// Session creation timestamp (Unix timestamp)
    pub created_at: u64,
}

/// State carried from the login redirect to the provider callback
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OAuthTempState {
    pub auth_provider: Provider,

    /// CSRF `state` parameter sent to the provider
    pub csrf_state: String,

    /// PKCE verifier, consumed by the token exchange
    pub pkce_verifier: Option<String>,

    pub created_at: u64,
}

pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl SessionData {
    pub fn new(user: &User, auth_provider: Provider) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            auth_provider,
            created_at: now_secs(),
        }
    }

    pub fn is_expired(&self, timeout_seconds: u64) -> bool {
        now_secs().saturating_sub(self.created_at) > timeout_seconds
    }
}

impl OAuthTempState {
    pub fn is_expired(&self) -> bool {
        now_secs().saturating_sub(self.created_at) > OAUTH_STATE_TTL_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            username: "ada".to_string(),
            google_id: Some("g-1".to_string()),
            facebook_id: None,
        }
    }

    #[test]
    fn test_fresh_session_not_expired() {
        let session = SessionData::new(&user(), Provider::Google);
        assert_eq!(session.user_id, "u1");
        assert!(!session.is_expired(60));
    }

    #[test]
    fn test_old_session_expired() {
        let mut session = SessionData::new(&user(), Provider::Google);
        session.created_at -= 120;
        assert!(session.is_expired(60));
    }

    #[test]
    fn test_future_timestamp_does_not_underflow() {
        let mut session = SessionData::new(&user(), Provider::Google);
        session.created_at += 3600;
        assert!(!session.is_expired(60));
    }

    #[test]
    fn test_temp_state_ttl() {
        let mut state = OAuthTempState {
            auth_provider: Provider::Facebook,
            csrf_state: "abc".to_string(),
            pkce_verifier: None,
            created_at: now_secs(),
        };
        assert!(!state.is_expired());
        state.created_at -= OAUTH_STATE_TTL_SECS + 1;
        assert!(state.is_expired());
    }
}
