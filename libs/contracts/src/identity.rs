//! Shapes exchanged with the OAuth2/OIDC identity provider.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Token endpoint response (authorization code and refresh grants).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub id_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Seconds until the access token expires
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_expires_in: i64,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Normalised userinfo claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    /// `preferred_username` on the provider side
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Everything the provider sent that is not mapped above
    #[serde(default)]
    pub claims: HashMap<String, Value>,
}

impl UserInfo {
    /// Maps a raw userinfo document; roles are read from `realm_access.roles`
    /// (Keycloak) or a top-level `roles` array.
    pub fn from_claims(raw: Value) -> Option<Self> {
        let Value::Object(mut map) = raw else {
            return None;
        };

        let mut take_str = |key: &str| -> Option<String> {
            match map.remove(key) {
                Some(Value::String(s)) => Some(s),
                _ => None,
            }
        };

        let sub = take_str("sub")?;
        let email = take_str("email").unwrap_or_default();
        let username = take_str("preferred_username").unwrap_or_default();
        let given_name = take_str("given_name").unwrap_or_default();
        let family_name = take_str("family_name").unwrap_or_default();
        let name = take_str("name").unwrap_or_default();

        let email_verified = matches!(map.remove("email_verified"), Some(Value::Bool(true)));

        let realm_roles = map
            .remove("realm_access")
            .and_then(|realm| realm.get("roles").cloned());
        let top_level_roles = map.remove("roles");
        let roles = realm_roles
            .or(top_level_roles)
            .and_then(|value| serde_json::from_value::<Vec<String>>(value).ok())
            .unwrap_or_default();

        Some(Self {
            sub,
            email,
            email_verified,
            username,
            given_name,
            family_name,
            name,
            roles,
            claims: map.into_iter().collect(),
        })
    }
}
