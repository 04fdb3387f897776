use crate::error::AuthError;
use crate::session::{now_secs, OAuthTempState};
use crate::user::{ExternalProfile, Provider};
use oauth2::{
    basic::BasicClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    PkceCodeChallenge, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;

const AUTH_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";
const TOKEN_URL: &str = "https://graph.facebook.com/v19.0/oauth/access_token";
const PROFILE_URL: &str = "https://graph.facebook.com/me";

#[derive(Deserialize)]
pub struct FacebookUser {
    pub id: String,
    pub name: Option<String>,
}

pub struct FacebookProvider {
    client: BasicClient,
}

impl FacebookProvider {
    pub fn new(app_id: &str, app_secret: &str, redirect_url: &str) -> Result<Self, AuthError> {
        // Graph API expects the app credentials in the form body
        let client = BasicClient::new(
            ClientId::new(app_id.to_string()),
            Some(ClientSecret::new(app_secret.to_string())),
            AuthUrl::new(AUTH_URL.to_string())?,
            Some(TokenUrl::new(TOKEN_URL.to_string())?),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(RedirectUrl::new(redirect_url.to_string())?);

        Ok(Self { client })
    }

    pub async fn start_auth(&self) -> Result<(String, OAuthTempState), AuthError> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("public_profile".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        let temp_state = OAuthTempState {
            auth_provider: Provider::Facebook,
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
            .map_err(|e| AuthError::OAuthError(format!("Facebook token exchange failed: {}", e)))?;

        let access_token = token_result.access_token().secret().clone();

        let user = reqwest::Client::new()
            .get(PROFILE_URL)
            .query(&[("fields", "id,name")])
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<FacebookUser>()
            .await?;

        Ok(facebook_profile(user))
    }
}

pub fn facebook_profile(user: FacebookUser) -> ExternalProfile {
    let display_name = user
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| user.id.clone());
    ExternalProfile {
        provider: Provider::Facebook,
        id: user.id,
        display_name,
    }
}
