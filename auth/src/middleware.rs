use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;

use crate::error::AuthError;
use crate::user::User;
use crate::AuthState;

/// Resolve the session cookie to the signed-in user
pub async fn current_user(auth_state: &AuthState, jar: &PrivateCookieJar) -> Result<User, AuthError> {
    let session_id = jar
        .get(&auth_state.config.session.cookie_name)
        .map(|c| c.value().to_string())
        .ok_or(AuthError::AuthenticationRequired)?;
    auth_state.authenticate(&session_id).await
}

/// Middleware to require authentication.
/// The signed-in [`User`] is placed in the request extensions.
pub async fn require_auth(
    State(auth_state): State<AuthState>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    // Skip authentication if disabled
    if !auth_state.is_enabled() {
        return next.run(request).await;
    }

    match current_user(&auth_state, &jar).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!("Session validation failed: {}", e);
            Redirect::to("/auth/login").into_response()
        }
    }
}

/// Middleware to optionally extract the signed-in user without requiring it
pub async fn optional_auth(
    State(auth_state): State<AuthState>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if auth_state.is_enabled() {
        if let Ok(user) = current_user(&auth_state, &jar).await {
            request.extensions_mut().insert(user);
        }
    }

    next.run(request).await
}
