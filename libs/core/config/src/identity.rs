//! Settings for the external OAuth2/OIDC identity provider.

use crate::{env_required, ConfigError, FromEnv};

/// Client registration at the identity provider (a Keycloak realm).
///
/// Loaded from:
/// - `IDP_AUTHORITY` (required), e.g. `https://sso.example.com/realms/storefront`
/// - `IDP_CLIENT_ID` (required)
/// - `IDP_CLIENT_SECRET` (required)
#[derive(Clone, Debug)]
pub struct IdentityProviderConfig {
    pub authority: String,
    pub client_id: String,
    pub client_secret: String,
}

impl IdentityProviderConfig {
    pub fn new(
        authority: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            authority: authority.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// URL of an OpenID Connect endpoint under the realm, e.g. `token` or `userinfo`.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/protocol/openid-connect/{}", self.authority, name)
    }
}

impl FromEnv for IdentityProviderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            env_required("IDP_AUTHORITY")?,
            env_required("IDP_CLIENT_ID")?,
            env_required("IDP_CLIENT_SECRET")?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = IdentityProviderConfig::new("http://localhost:8180/realms/shop/", "web", "s3cret");
        assert_eq!(
            config.endpoint("token"),
            "http://localhost:8180/realms/shop/protocol/openid-connect/token"
        );
    }

    #[test]
    fn test_from_env_requires_all_values() {
        temp_env::with_vars(
            [
                ("IDP_AUTHORITY", Some("http://localhost:8180/realms/shop")),
                ("IDP_CLIENT_ID", Some("web")),
                ("IDP_CLIENT_SECRET", None::<&str>),
            ],
            || {
                let err = IdentityProviderConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("IDP_CLIENT_SECRET"));
            },
        );
    }

    #[test]
    fn test_from_env_success() {
        temp_env::with_vars(
            [
                ("IDP_AUTHORITY", Some("http://localhost:8180/realms/shop")),
                ("IDP_CLIENT_ID", Some("web")),
                ("IDP_CLIENT_SECRET", Some("s3cret")),
            ],
            || {
                let config = IdentityProviderConfig::from_env().unwrap();
                assert_eq!(config.client_id, "web");
                assert_eq!(config.client_secret, "s3cret");
            },
        );
    }
}
