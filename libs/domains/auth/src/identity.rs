//! Client for the OAuth2/OIDC identity provider (a Keycloak realm).
//!
//! Every call is a single round trip. Failures are logged with their cause and surface
//! as [`AuthError::IdentityProvider`] with a fixed message.

use std::time::Duration;

use async_trait::async_trait;
use contracts::identity::{TokenResponse, UserInfo};
use core_config::identity::IdentityProviderConfig;
use oauth2::basic::BasicClient;
use oauth2::url::Url;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

pub const SCOPES: [&str; 3] = ["openid", "profile", "email"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start the authorization code flow.
    fn authorization_url(&self, redirect_uri: &str, state: &str) -> AuthResult<String>;

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> AuthResult<TokenResponse>;

    async fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse>;

    async fn user_info(&self, access_token: &str) -> AuthResult<UserInfo>;

    /// Token introspection; any failure counts as inactive.
    async fn validate_token(&self, token: &str) -> bool;

    /// Ends the provider session behind `refresh_token`.
    async fn revoke_token(&self, refresh_token: &str) -> bool;

    /// `id_token_hint` is added when non-empty.
    fn logout_url(&self, redirect_uri: &str, id_token_hint: &str) -> AuthResult<String>;
}

#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    #[serde(default)]
    active: bool,
}

pub struct KeycloakClient {
    config: IdentityProviderConfig,
    http: reqwest::Client,
}

impl KeycloakClient {
    pub fn new(config: IdentityProviderConfig) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
        failure: &'static str,
    ) -> AuthResult<TokenResponse> {
        let response = self
            .http
            .post(self.config.endpoint("token"))
            .form(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Token endpoint unreachable");
                AuthError::IdentityProvider(failure.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %body, "Token endpoint rejected request");
            return Err(AuthError::IdentityProvider(failure.to_string()));
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            tracing::warn!(error = %e, "Unreadable token response");
            AuthError::IdentityProvider(failure.to_string())
        })
    }
}

#[async_trait]
impl IdentityProvider for KeycloakClient {
    fn authorization_url(&self, redirect_uri: &str, state: &str) -> AuthResult<String> {
        let auth_url = AuthUrl::new(self.config.endpoint("auth"))
            .map_err(|e| AuthError::Internal(format!("Invalid authorization endpoint: {e}")))?;
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AuthError::IdentityProvider(format!("Invalid redirect URI: {e}")))?;

        let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_auth_uri(auth_url)
            .set_redirect_uri(redirect_url);

        let state = state.to_string();
        let (url, _csrf) = client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .url();

        Ok(url.to_string())
    }

    #[tracing::instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> AuthResult<TokenResponse> {
        self.token_request(
            &[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ],
            "Failed to exchange authorization code for token",
        )
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        self.token_request(
            &[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ],
            "Failed to refresh token",
        )
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn user_info(&self, access_token: &str) -> AuthResult<UserInfo> {
        const FAILURE: &str = "Failed to get user info";

        let response = self
            .http
            .get(self.config.endpoint("userinfo"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Userinfo endpoint unreachable");
                AuthError::IdentityProvider(FAILURE.to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Userinfo endpoint rejected token");
            return Err(AuthError::IdentityProvider(FAILURE.to_string()));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Unreadable userinfo response");
            AuthError::IdentityProvider(FAILURE.to_string())
        })?;

        UserInfo::from_claims(raw).ok_or_else(|| {
            tracing::warn!("Userinfo response has no subject");
            AuthError::IdentityProvider(FAILURE.to_string())
        })
    }

    #[tracing::instrument(skip_all)]
    async fn validate_token(&self, token: &str) -> bool {
        let result = self
            .http
            .post(self.config.endpoint("token/introspect"))
            .form(&[
                ("token", token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Introspection rejected");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Introspection endpoint unreachable");
                return false;
            }
        };

        match response.json::<IntrospectionResponse>().await {
            Ok(introspection) => introspection.active,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable introspection response");
                false
            }
        }
    }

    #[tracing::instrument(skip_all)]
    async fn revoke_token(&self, refresh_token: &str) -> bool {
        let result = self
            .http
            .post(self.config.endpoint("logout"))
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Provider logout rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Logout endpoint unreachable");
                false
            }
        }
    }

    fn logout_url(&self, redirect_uri: &str, id_token_hint: &str) -> AuthResult<String> {
        let mut url = Url::parse_with_params(
            &self.config.endpoint("logout"),
            [
                ("client_id", self.config.client_id.as_str()),
                ("post_logout_redirect_uri", redirect_uri),
            ],
        )
        .map_err(|e| AuthError::Internal(format!("Invalid logout endpoint: {e}")))?;

        if !id_token_hint.is_empty() {
            url.query_pairs_mut()
                .append_pair("id_token_hint", id_token_hint);
        }

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(authority: &str) -> KeycloakClient {
        KeycloakClient::new(IdentityProviderConfig::new(authority, "storefront", "s3cret")).unwrap()
    }

    fn query(url: &str) -> Vec<(String, String)> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_authorization_url_carries_code_flow_parameters() {
        let url = client("http://sso.test/realms/shop")
            .authorization_url("http://app.test/callback", "xyz")
            .unwrap();

        assert!(url.starts_with("http://sso.test/realms/shop/protocol/openid-connect/auth?"));
        let params = query(&url);
        for expected in [
            ("client_id", "storefront"),
            ("response_type", "code"),
            ("scope", "openid profile email"),
            ("redirect_uri", "http://app.test/callback"),
            ("state", "xyz"),
        ] {
            assert!(
                params.contains(&(expected.0.to_string(), expected.1.to_string())),
                "missing {expected:?} in {url}"
            );
        }
    }

    #[test]
    fn test_authorization_url_rejects_bad_redirect() {
        let result = client("http://sso.test/realms/shop").authorization_url("not a url", "s");
        assert!(matches!(result, Err(AuthError::IdentityProvider(_))));
    }

    #[test]
    fn test_logout_url_hint_is_optional() {
        let client = client("http://sso.test/realms/shop");

        let without = client.logout_url("http://app.test/", "").unwrap();
        assert!(without.starts_with("http://sso.test/realms/shop/protocol/openid-connect/logout?"));
        assert!(!without.contains("id_token_hint"));
        assert!(query(&without).contains(&(
            "post_logout_redirect_uri".to_string(),
            "http://app.test/".to_string()
        )));

        let with = client.logout_url("http://app.test/", "id.jwt").unwrap();
        assert!(query(&with).contains(&("id_token_hint".to_string(), "id.jwt".to_string())));
    }

    #[tokio::test]
    async fn test_unreachable_provider_maps_to_fixed_messages() {
        // Nothing listens on the discard port.
        let client = client("http://127.0.0.1:9/realms/shop");

        let err = client.exchange_code("code", "http://app.test/cb").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to exchange authorization code for token");

        let err = client.refresh_token("rt").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to refresh token");

        let err = client.user_info("at").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get user info");

        assert!(!client.validate_token("at").await);
        assert!(!client.revoke_token("rt").await);
    }
}
