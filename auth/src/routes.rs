use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::middleware::current_user;
use crate::session::OAUTH_STATE_TTL_SECS;
use crate::user::{ExternalProfile, Provider};
use crate::views::login_page_html;
use crate::AuthState;

/// Cookie name for storing OAuth temp state ID during OAuth flow
pub const OAUTH_STATE_COOKIE: &str = "oauth_state_id";

#[derive(Deserialize)]
struct LoginPageQuery {
    error: Option<String>,
}

#[derive(Deserialize)]
struct AuthCallback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Serialize)]
struct MeResponse {
    id: String,
    username: String,
    google_linked: bool,
    facebook_linked: bool,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AuthState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/google/login", get(google_login))
        .route("/google/redirect", get(google_callback))
        .route("/facebook/login", get(facebook_login))
        .route("/facebook/redirect", get(facebook_callback))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login_page(
    State(auth_state): State<AuthState>,
    Query(query): Query<LoginPageQuery>,
) -> Html<String> {
    Html(login_page_html(
        auth_state.is_provider_enabled(Provider::Google),
        auth_state.is_provider_enabled(Provider::Facebook),
        query.error.as_deref(),
    ))
}

/// Session cookie carrying the server-side session id
pub fn session_cookie(auth_state: &AuthState, session_id: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(auth_state.config.session.cookie_name.clone(), session_id);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    if auth_state.config.session.secure {
        cookie.set_secure(true);
    }
    let max_age = i64::try_from(auth_state.config.session.timeout_seconds).unwrap_or(i64::MAX);
    cookie.set_max_age(time::Duration::seconds(max_age));
    cookie
}

/// Helper to create OAuth state cookie (temporary, for OAuth flow)
fn create_oauth_state_cookie(state_id: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(OAUTH_STATE_COOKIE, state_id);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_max_age(time::Duration::seconds(OAUTH_STATE_TTL_SECS as i64));
    cookie
}

fn failed_login(provider: Provider) -> Response {
    Redirect::to(&format!("/auth/login?error={}_auth_failed", provider)).into_response()
}

async fn start_login(
    provider: Provider,
    auth_state: AuthState,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Response), StatusCode> {
    let (auth_url, temp_state) = auth_state
        .start_auth(provider)
        .await
        .map_err(|e| {
            tracing::error!("{} auth start failed: {}", provider, e);
            StatusCode::from(e)
        })?;

    let state_id = auth_state.store_oauth_temp_state(temp_state).await;

    // Store state ID in cookie for callback
    let state_cookie = create_oauth_state_cookie(state_id, auth_state.config.session.secure);
    let updated_jar = jar.add(state_cookie);

    Ok((
        updated_jar,
        (StatusCode::FOUND, [(header::LOCATION, auth_url)]).into_response(),
    ))
}

async fn finish_login(
    provider: Provider,
    auth_state: AuthState,
    jar: PrivateCookieJar,
    query: AuthCallback,
) -> Result<(PrivateCookieJar, Response), StatusCode> {
    if let Some(error) = &query.error {
        let error_msg = query.error_description.as_deref().unwrap_or("Unknown error");
        tracing::error!("{} OAuth error: {} - {}", provider, error, error_msg);
        return Ok((jar.remove(Cookie::from(OAUTH_STATE_COOKIE)), failed_login(provider)));
    }

    let code = query.code.as_deref().ok_or(StatusCode::BAD_REQUEST)?;

    // Get OAuth state ID from cookie
    let state_id = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let temp_state = auth_state
        .take_oauth_temp_state(&state_id)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    auth_state
        .verify_csrf_state(&temp_state, query.state.as_deref())
        .map_err(|e| {
            tracing::warn!("{} callback rejected: {}", provider, e);
            StatusCode::from(e)
        })?;

    // A login started with one provider cannot finish at another
    if temp_state.auth_provider != provider {
        tracing::warn!(
            "{} callback rejected: login was started with {}",
            provider,
            temp_state.auth_provider
        );
        return Err(StatusCode::UNAUTHORIZED);
    }

    let profile = match auth_state.complete_auth(provider, code, &temp_state).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("{} auth completion failed: {}", provider, e);
            return Ok((jar.remove(Cookie::from(OAUTH_STATE_COOKIE)), failed_login(provider)));
        }
    };

    Ok(sign_in_response(provider, &auth_state, jar, &profile).await)
}

/// Reconcile the profile, start a session and send the browser home
async fn sign_in_response(
    provider: Provider,
    auth_state: &AuthState,
    jar: PrivateCookieJar,
    profile: &ExternalProfile,
) -> (PrivateCookieJar, Response) {
    let jar = jar.remove(Cookie::from(OAUTH_STATE_COOKIE));

    match auth_state.sign_in(profile).await {
        Ok((session_id, _user)) => {
            let cookie = session_cookie(auth_state, session_id);
            (
                jar.add(cookie),
                (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response(),
            )
        }
        Err(e) => {
            tracing::error!("{} sign-in failed for profile {}: {}", provider, profile.id, e);
            (jar, failed_login(provider))
        }
    }
}

async fn google_login(
    State(auth_state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Response), StatusCode> {
    start_login(Provider::Google, auth_state, jar).await
}

async fn google_callback(
    State(auth_state): State<AuthState>,
    jar: PrivateCookieJar,
    Query(query): Query<AuthCallback>,
) -> Result<(PrivateCookieJar, Response), StatusCode> {
    finish_login(Provider::Google, auth_state, jar, query).await
}

async fn facebook_login(
    State(auth_state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Response), StatusCode> {
    start_login(Provider::Facebook, auth_state, jar).await
}

async fn facebook_callback(
    State(auth_state): State<AuthState>,
    jar: PrivateCookieJar,
    Query(query): Query<AuthCallback>,
) -> Result<(PrivateCookieJar, Response), StatusCode> {
    finish_login(Provider::Facebook, auth_state, jar, query).await
}

async fn logout(
    State(auth_state): State<AuthState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Response) {
    let cookie_name = auth_state.config.session.cookie_name.clone();
    if let Some(cookie) = jar.get(&cookie_name) {
        auth_state.remove_session(cookie.value()).await;
    }
    let updated_jar = jar.remove(Cookie::from(cookie_name));

    (updated_jar, Redirect::to("/auth/login").into_response())
}

async fn me(
    State(auth_state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Result<Json<MeResponse>, StatusCode> {
    let user = current_user(&auth_state, &jar).await.map_err(StatusCode::from)?;
    Ok(Json(MeResponse {
        google_linked: user.identity(Provider::Google).is_some(),
        facebook_linked: user.identity(Provider::Facebook).is_some(),
        id: user.id,
        username: user.username,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::service::AuthService;
    use crate::store::{MemoryUserStore, StoreError, UserQuery, UserStore};
    use crate::user::{NewUser, User};
    use async_trait::async_trait;
    use axum::http::{HeaderMap, HeaderValue};
    use std::sync::Arc;

    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn find_one(&self, _query: &UserQuery) -> Result<Option<User>, StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }

        async fn find_by_id(&self, _id: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }

        async fn create(&self, _user: NewUser) -> Result<User, StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }

        async fn save(&self, _user: &User) -> Result<User, StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }
    }

    async fn auth_state(store: Arc<dyn UserStore>) -> AuthState {
        let mut config = AuthConfig::default();
        config.enable_auth = true;
        let service = AuthService::new(config, store).await.unwrap();
        AuthState::new(Arc::new(service))
    }

    /// Jar as received on the callback request, holding an encrypted state cookie
    fn callback_jar(auth_state: &AuthState) -> PrivateCookieJar {
        let issued = PrivateCookieJar::new(auth_state.cookie_key())
            .add(Cookie::new(OAUTH_STATE_COOKIE, "state-1"))
            .into_response();

        let mut headers = HeaderMap::new();
        for value in issued.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap();
            headers.append(header::COOKIE, HeaderValue::from_str(pair).unwrap());
        }
        PrivateCookieJar::from_headers(&headers, auth_state.cookie_key())
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn profile() -> ExternalProfile {
        ExternalProfile {
            provider: Provider::Facebook,
            id: "fb-7".to_string(),
            display_name: "Grace Hopper".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_sets_session_and_goes_home() {
        let store = Arc::new(MemoryUserStore::new());
        let auth_state = auth_state(store.clone()).await;
        let jar = callback_jar(&auth_state);

        let (jar, response) = sign_in_response(Provider::Facebook, &auth_state, jar, &profile()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        let cookies = set_cookies(&jar.into_response());
        let session = cookies
            .iter()
            .find(|c| c.starts_with("session_id="))
            .expect("session cookie");
        assert!(!session.starts_with("session_id=;"));
        let removed = cookies
            .iter()
            .find(|c| c.starts_with("oauth_state_id="))
            .expect("state cookie removal");
        assert!(removed.contains("Max-Age=0"));

        assert_eq!(auth_state.session_count().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sign_in_store_failure_redirects_to_login() {
        let auth_state = auth_state(Arc::new(BrokenStore)).await;
        let jar = callback_jar(&auth_state);

        let (jar, response) = sign_in_response(Provider::Facebook, &auth_state, jar, &profile()).await;
        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login?error=facebook_auth_failed"
        );

        let cookies = set_cookies(&jar.into_response());
        assert!(cookies.iter().all(|c| !c.starts_with("session_id=")));
        assert!(cookies.iter().any(|c| c.starts_with("oauth_state_id=")));
        assert_eq!(auth_state.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_session_cookie_max_age_saturates() {
        let mut config = AuthConfig::default();
        config.session.timeout_seconds = u64::MAX;
        let service = AuthService::new(config, Arc::new(MemoryUserStore::new())).await.unwrap();
        let auth_state = AuthState::new(Arc::new(service));

        let cookie = session_cookie(&auth_state, "s-1".to_string());
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(i64::MAX)));
    }
}
