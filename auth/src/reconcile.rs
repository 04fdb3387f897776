//! Matching an external profile to a local user.
//!
//! Google identities are looked up by Google id only. Facebook identities are
//! looked up by Facebook id or by username, and an existing user found by
//! username gets the Facebook id attached. In both cases a miss creates a new
//! user linked to the identity.
//!
//! There is no lock around find-then-create: two first logins racing for the
//! same new identity can both create a user.

use crate::error::AuthError;
use crate::store::{StoreError, UserQuery, UserStore};
use crate::user::{ExternalProfile, NewUser, Provider, User};

pub async fn reconcile(store: &dyn UserStore, profile: &ExternalProfile) -> Result<User, AuthError> {
    let result = match profile.provider {
        Provider::Google => reconcile_google(store, profile).await,
        Provider::Facebook => reconcile_facebook(store, profile).await,
    };

    result.map_err(|e| {
        tracing::error!(
            "Failed to reconcile {} profile {}: {}",
            profile.provider,
            profile.id,
            e
        );
        AuthError::Store(e)
    })
}

async fn reconcile_google(store: &dyn UserStore, profile: &ExternalProfile) -> Result<User, StoreError> {
    let query = UserQuery::GoogleId(profile.id.clone());
    if let Some(user) = store.find_one(&query).await? {
        return Ok(user);
    }
    create_user(store, profile).await
}

async fn reconcile_facebook(store: &dyn UserStore, profile: &ExternalProfile) -> Result<User, StoreError> {
    let query = UserQuery::AnyOf(vec![
        UserQuery::FacebookId(profile.id.clone()),
        UserQuery::Username(profile.display_name.clone()),
    ]);

    match store.find_one(&query).await? {
        Some(mut user) if user.facebook_id.is_none() => {
            user.link(Provider::Facebook, profile.id.clone());
            let updated = store.save(&user).await?;
            tracing::info!("Linked Facebook identity to user {}", updated.id);
            Ok(updated)
        }
        Some(user) => Ok(user),
        None => create_user(store, profile).await,
    }
}

async fn create_user(store: &dyn UserStore, profile: &ExternalProfile) -> Result<User, StoreError> {
    let user = store.create(NewUser::from_profile(profile)).await?;
    tracing::info!(
        "New user created: {} ({}) via {}",
        user.id,
        user.username,
        profile.provider
    );
    Ok(user)
}
