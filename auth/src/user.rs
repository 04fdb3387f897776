//! Local user records and the external identities linked to them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// External OAuth identity issuer
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }

    /// Path the provider redirects back to after consent
    pub fn callback_path(&self) -> &'static str {
        match self {
            Provider::Google => "/auth/google/redirect",
            Provider::Facebook => "/auth/facebook/redirect",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local user. Either, both or neither external identity may be linked.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
}

impl User {
    /// Provider-issued id linked to this user, if any
    pub fn identity(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Google => self.google_id.as_deref(),
            Provider::Facebook => self.facebook_id.as_deref(),
        }
    }

    pub fn link(&mut self, provider: Provider, provider_id: String) {
        match provider {
            Provider::Google => self.google_id = Some(provider_id),
            Provider::Facebook => self.facebook_id = Some(provider_id),
        }
    }
}

/// A user that has not been persisted yet; the store assigns the id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
}

impl NewUser {
    /// New user named after the profile and linked to its identity
    pub fn from_profile(profile: &ExternalProfile) -> Self {
        let mut user = Self {
            username: profile.display_name.clone(),
            ..Self::default()
        };
        match profile.provider {
            Provider::Google => user.google_id = Some(profile.id.clone()),
            Provider::Facebook => user.facebook_id = Some(profile.id.clone()),
        }
        user
    }
}

/// Identity returned by a provider for one authentication attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalProfile {
    pub provider: Provider,
    pub id: String,
    pub display_name: String,
}
