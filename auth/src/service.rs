use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::providers::{FacebookProvider, GoogleProvider};
use crate::reconcile::reconcile;
use crate::session::{OAuthTempState, SessionData};
use crate::store::UserStore;
use crate::user::{ExternalProfile, Provider, User};
use axum_extra::extract::cookie::Key;
use base64::Engine;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Main authentication service
pub struct AuthService {
    pub config: AuthConfig,
    store: Arc<dyn UserStore>,
    sessions: RwLock<HashMap<String, SessionData>>,
    oauth_temp_states: RwLock<HashMap<String, OAuthTempState>>,
    google_provider: Option<GoogleProvider>,
    facebook_provider: Option<FacebookProvider>,
    cookie_key: Key,
}

fn required<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str, AuthError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::ConfigError(format!("{} not configured", what)))
}

fn cookie_key(secret: Option<&str>) -> Result<Key, AuthError> {
    match secret {
        Some(secret) => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(secret.trim())
                .map_err(|e| AuthError::ConfigError(format!("Invalid cookie_secret: {}", e)))?;
            Key::try_from(bytes.as_slice()).map_err(|_| {
                AuthError::ConfigError("cookie_secret must decode to at least 64 bytes".to_string())
            })
        }
        None => {
            tracing::warn!("No session cookie_secret configured, generating a random key");
            Ok(Key::generate())
        }
    }
}

impl AuthService {
    pub async fn new(config: AuthConfig, store: Arc<dyn UserStore>) -> Result<Self, AuthError> {
        let google_provider = if config.oauth.enable_google {
            Some(GoogleProvider::new(
                required(&config.oauth.google_client_id, "Google client_id")?,
                required(&config.oauth.google_client_secret, "Google client_secret")?,
                &config.redirect_url(Provider::Google),
            )?)
        } else {
            None
        };

        let facebook_provider = if config.oauth.enable_facebook {
            Some(FacebookProvider::new(
                required(&config.oauth.facebook_app_id, "Facebook app_id")?,
                required(&config.oauth.facebook_app_secret, "Facebook app_secret")?,
                &config.redirect_url(Provider::Facebook),
            )?)
        } else {
            None
        };

        let cookie_key = cookie_key(config.session.cookie_secret.as_deref())?;

        Ok(Self {
            config,
            store,
            sessions: RwLock::new(HashMap::new()),
            oauth_temp_states: RwLock::new(HashMap::new()),
            google_provider,
            facebook_provider,
            cookie_key,
        })
    }

    /// Check if authentication is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enable_auth
    }

    /// Check if any provider is enabled
    pub fn has_enabled_providers(&self) -> bool {
        self.google_provider.is_some() || self.facebook_provider.is_some()
    }

    pub fn is_provider_enabled(&self, provider: Provider) -> bool {
        match provider {
            Provider::Google => self.google_provider.is_some(),
            Provider::Facebook => self.facebook_provider.is_some(),
        }
    }

    pub fn cookie_key(&self) -> Key {
        self.cookie_key.clone()
    }

    /// Build the provider authorization URL and the state to keep until the callback
    pub async fn start_auth(&self, provider: Provider) -> Result<(String, OAuthTempState), AuthError> {
        match provider {
            Provider::Google => self.google()?.start_auth().await,
            Provider::Facebook => self.facebook()?.start_auth().await,
        }
    }

    /// Exchange the authorization code and fetch the provider profile
    pub async fn complete_auth(
        &self,
        provider: Provider,
        code: &str,
        temp_state: &OAuthTempState,
    ) -> Result<ExternalProfile, AuthError> {
        if temp_state.auth_provider != provider {
            return Err(AuthError::StateMismatch);
        }
        match provider {
            Provider::Google => self.google()?.complete_auth(code, temp_state).await,
            Provider::Facebook => self.facebook()?.complete_auth(code, temp_state).await,
        }
    }

    fn google(&self) -> Result<&GoogleProvider, AuthError> {
        self.google_provider
            .as_ref()
            .ok_or_else(|| AuthError::ProviderDisabled(Provider::Google.to_string()))
    }

    fn facebook(&self) -> Result<&FacebookProvider, AuthError> {
        self.facebook_provider
            .as_ref()
            .ok_or_else(|| AuthError::ProviderDisabled(Provider::Facebook.to_string()))
    }

    pub fn verify_csrf_state(&self, temp_state: &OAuthTempState, returned: Option<&str>) -> Result<(), AuthError> {
        match returned {
            Some(state) if state == temp_state.csrf_state => Ok(()),
            _ => Err(AuthError::StateMismatch),
        }
    }

    /// Store OAuth temp state under a fresh id and return the id
    pub async fn store_oauth_temp_state(&self, temp_state: OAuthTempState) -> String {
        let state_id = Uuid::new_v4().to_string();
        let mut states = self.oauth_temp_states.write().await;
        states.insert(state_id.clone(), temp_state);
        state_id
    }

    /// Remove and return OAuth temp state; expired state is dropped
    pub async fn take_oauth_temp_state(&self, state_id: &str) -> Option<OAuthTempState> {
        let mut states = self.oauth_temp_states.write().await;
        states.remove(state_id).filter(|s| !s.is_expired())
    }

    /// Reconcile the profile with a local user and open a session for it
    pub async fn sign_in(&self, profile: &ExternalProfile) -> Result<(String, User), AuthError> {
        let user = reconcile(self.store.as_ref(), profile).await?;

        let session_id = Uuid::new_v4().to_string();
        self.store_session(session_id.clone(), SessionData::new(&user, profile.provider))
            .await;
        tracing::info!("User {} signed in via {}", user.id, profile.provider);

        Ok((session_id, user))
    }

    /// Value kept in the session for a user
    pub fn serialize_user(&self, user: &User) -> String {
        user.id.clone()
    }

    /// Load the user a session points at
    pub async fn deserialize_user(&self, user_id: &str) -> Result<User, AuthError> {
        match self.store.find_by_id(user_id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthError::UserNotFound(user_id.to_string())),
            Err(e) => {
                tracing::error!("Failed to load user {}: {}", user_id, e);
                Err(e.into())
            }
        }
    }

    /// Store session data
    pub async fn store_session(&self, session_id: String, session_data: SessionData) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, session_data);
    }

    /// Get session data
    pub async fn get_session(&self, session_id: &str) -> Option<SessionData> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Remove session (logout)
    pub async fn remove_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }

    /// Validate session and check expiration
    pub async fn validate_session(&self, session_id: &str) -> Result<SessionData, AuthError> {
        let session_data = self.get_session(session_id).await
            .ok_or(AuthError::SessionNotFound)?;

        if session_data.is_expired(self.config.session.timeout_seconds) {
            self.remove_session(session_id).await;
            return Err(AuthError::SessionExpired);
        }

        Ok(session_data)
    }

    /// Resolve a session id to its user
    pub async fn authenticate(&self, session_id: &str) -> Result<User, AuthError> {
        let session = self.validate_session(session_id).await?;
        self.deserialize_user(&session.user_id).await
    }

    /// Clean up expired sessions and abandoned login attempts
    pub async fn cleanup_expired(&self) {
        let timeout = self.config.session.timeout_seconds;
        {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|_, session| !session.is_expired(timeout));
        }
        let mut states = self.oauth_temp_states.write().await;
        states.retain(|_, state| !state.is_expired());
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::now_secs;
    use crate::store::MemoryUserStore;

    fn google_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.enable_auth = true;
        config.oauth.enable_google = true;
        config.oauth.google_client_id = Some("client".to_string());
        config.oauth.google_client_secret = Some("secret".to_string());
        config
    }

    async fn service(config: AuthConfig) -> AuthService {
        AuthService::new(config, Arc::new(MemoryUserStore::new())).await.unwrap()
    }

    fn profile() -> ExternalProfile {
        ExternalProfile {
            provider: Provider::Google,
            id: "g-1".to_string(),
            display_name: "Ada Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected() {
        let mut config = google_config();
        config.oauth.google_client_secret = None;
        let result = AuthService::new(config, Arc::new(MemoryUserStore::new())).await;
        assert!(matches!(result, Err(AuthError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_short_cookie_secret_rejected() {
        let mut config = google_config();
        config.session.cookie_secret = Some(base64::engine::general_purpose::STANDARD.encode([7u8; 16]));
        let result = AuthService::new(config, Arc::new(MemoryUserStore::new())).await;
        assert!(matches!(result, Err(AuthError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_configured_cookie_secret_is_stable() {
        let mut config = google_config();
        config.session.cookie_secret = Some(base64::engine::general_purpose::STANDARD.encode([7u8; 64]));
        let a = service(config.clone()).await;
        let b = service(config).await;
        assert_eq!(a.cookie_key().master(), b.cookie_key().master());
    }

    #[tokio::test]
    async fn test_disabled_provider() {
        let svc = service(google_config()).await;
        assert!(svc.has_enabled_providers());
        assert!(svc.is_provider_enabled(Provider::Google));
        assert!(!svc.is_provider_enabled(Provider::Facebook));
        assert!(matches!(
            svc.start_auth(Provider::Facebook).await,
            Err(AuthError::ProviderDisabled(_))
        ));
    }

    #[tokio::test]
    async fn test_temp_state_is_single_use() {
        let svc = service(google_config()).await;
        let (_, state) = svc.start_auth(Provider::Google).await.unwrap();
        let id = svc.store_oauth_temp_state(state).await;
        assert!(svc.take_oauth_temp_state(&id).await.is_some());
        assert!(svc.take_oauth_temp_state(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_temp_state_is_dropped() {
        let svc = service(google_config()).await;
        let (_, mut state) = svc.start_auth(Provider::Google).await.unwrap();
        state.created_at = now_secs() - 3600;
        let id = svc.store_oauth_temp_state(state).await;
        assert!(svc.take_oauth_temp_state(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_csrf_state_check() {
        let svc = service(google_config()).await;
        let (_, state) = svc.start_auth(Provider::Google).await.unwrap();
        let expected = state.csrf_state.clone();
        assert!(svc.verify_csrf_state(&state, Some(&expected)).is_ok());
        assert!(matches!(svc.verify_csrf_state(&state, Some("forged")), Err(AuthError::StateMismatch)));
        assert!(matches!(svc.verify_csrf_state(&state, None), Err(AuthError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_sign_in_then_authenticate() {
        let svc = service(google_config()).await;
        let (session_id, user) = svc.sign_in(&profile()).await.unwrap();
        assert_eq!(svc.serialize_user(&user), user.id);

        let loaded = svc.authenticate(&session_id).await.unwrap();
        assert_eq!(loaded, user);

        // A second sign-in reuses the same user
        let (_, again) = svc.sign_in(&profile()).await.unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(svc.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let mut config = google_config();
        config.session.timeout_seconds = 60;
        let svc = service(config).await;
        let (session_id, _) = svc.sign_in(&profile()).await.unwrap();

        let mut session = svc.get_session(&session_id).await.unwrap();
        session.created_at -= 120;
        svc.store_session(session_id.clone(), session).await;

        assert!(matches!(svc.validate_session(&session_id).await, Err(AuthError::SessionExpired)));
        assert!(svc.get_session(&session_id).await.is_none());
    }

    #[tokio::test]
    async fn test_deserialize_unknown_user() {
        let svc = service(google_config()).await;
        assert!(matches!(svc.deserialize_user("nope").await, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let mut config = google_config();
        config.session.timeout_seconds = 60;
        let svc = service(config).await;
        let (stale, _) = svc.sign_in(&profile()).await.unwrap();
        let (fresh, _) = svc.sign_in(&profile()).await.unwrap();

        let mut session = svc.get_session(&stale).await.unwrap();
        session.created_at -= 120;
        svc.store_session(stale.clone(), session).await;

        svc.cleanup_expired().await;
        assert!(svc.get_session(&stale).await.is_none());
        assert!(svc.get_session(&fresh).await.is_some());
    }
}
