use serde::{Deserialize, Serialize};

use crate::user::Provider;

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Enable authentication globally
    #[serde(default)]
    pub enable_auth: bool,

    /// Externally visible base URL, used to build default OAuth redirect URLs
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// OAuth2 providers configuration
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Enable Google OAuth
    #[serde(default)]
    pub enable_google: bool,

    /// Enable Facebook OAuth
    #[serde(default)]
    pub enable_facebook: bool,

    /// Google OAuth credentials
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_url: Option<String>,

    /// Facebook app credentials
    pub facebook_app_id: Option<String>,
    pub facebook_app_secret: Option<String>,
    pub facebook_redirect_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session cookie name
    #[serde(default = "default_session_cookie_name")]
    pub cookie_name: String,

    /// Session timeout in seconds (default: 24 hours)
    #[serde(default = "default_session_timeout")]
    pub timeout_seconds: u64,

    /// Secure cookie (HTTPS only)
    #[serde(default)]
    pub secure: bool,

    /// Base64 encoded key (at least 64 bytes) for private cookies.
    /// A random key is generated at startup when unset, which logs everybody
    /// out on restart.
    #[serde(default)]
    pub cookie_secret: Option<String>,
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_session_cookie_name() -> String {
    "session_id".to_string()
}

fn default_session_timeout() -> u64 {
    86400 // 24 hours
}

impl AuthConfig {
    /// Redirect URL registered with the provider: the explicit one when
    /// configured, otherwise `{public_base_url}/auth/{provider}/redirect`.
    pub fn redirect_url(&self, provider: Provider) -> String {
        let explicit = match provider {
            Provider::Google => self.oauth.google_redirect_url.as_ref(),
            Provider::Facebook => self.oauth.facebook_redirect_url.as_ref(),
        };
        match explicit {
            Some(url) => url.clone(),
            None => format!(
                "{}{}",
                self.public_base_url.trim_end_matches('/'),
                provider.callback_path()
            ),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enable_auth: false,
            public_base_url: default_public_base_url(),
            oauth: OAuthConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_session_cookie_name(),
            timeout_seconds: default_session_timeout(),
            secure: false,
            cookie_secret: None,
        }
    }
}
