use crate::error::AuthError;
use crate::session::{now_secs, OAuthTempState};
use crate::user::{ExternalProfile, Provider};
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    PkceCodeChallenge, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

#[derive(Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub name: Option<String>,
}

pub struct GoogleProvider {
    client: BasicClient,
}

impl GoogleProvider {
    pub fn new(client_id: &str, client_secret: &str, redirect_url: &str) -> Result<Self, AuthError> {
        let client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            AuthUrl::new(AUTH_URL.to_string())?,
            Some(TokenUrl::new(TOKEN_URL.to_string())?),
        )
        .set_redirect_uri(RedirectUrl::new(redirect_url.to_string())?);

        Ok(Self { client })
    }

    pub async fn start_auth(&self) -> Result<(String, OAuthTempState), AuthError> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        let temp_state = OAuthTempState {
            auth_provider: Provider::Google,
            csrf_state: csrf_state.secret().clone(),
            pkce_verifier: Some(pkce_verifier.secret().clone()),
            created_at: now_secs(),
        };

        Ok((auth_url.to_string(), temp_state))
    }

    pub async fn complete_auth(
        &self,
        code: &str,
        temp_state: &OAuthTempState,
    ) -> Result<ExternalProfile, AuthError> {
        let mut token_request = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()));
        if let Some(verifier) = &temp_state.pkce_verifier {
            token_request = token_request.set_pkce_verifier(oauth2::PkceCodeVerifier::new(verifier.clone()));
        }

        let token_result = token_request
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::OAuthError(format!("Google token exchange failed: {}", e)))?;

        let access_token = token_result.access_token().secret().clone();

        let user_info = reqwest::Client::new()
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<GoogleUserInfo>()
            .await?;

        Ok(google_profile(user_info))
    }
}

pub fn google_profile(user_info: GoogleUserInfo) -> ExternalProfile {
    let display_name = user_info
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| user_info.sub.clone());
    ExternalProfile {
        provider: Provider::Google,
        id: user_info.sub,
        display_name,
    }
}
