//! Bearer-token verification settings, loaded through `core_config::FromEnv`.

use core_config::{ConfigError, FromEnv, env_optional, env_parse};

/// Minimum length of a shared HS256 secret.
pub const MIN_SECRET_LEN: usize = 32;

/// How access tokens issued by the identity provider are verified.
///
/// - `JWT_ISSUER` (default `IDP_AUTHORITY`, one of them required)
/// - `JWT_AUDIENCE` (optional; audience is not checked when unset)
/// - `JWT_JWKS_URL` (default `{issuer}/protocol/openid-connect/certs`)
/// - `JWT_SECRET` (optional, at least 32 chars; switches verification to HS256)
/// - `JWT_CLOCK_SKEW_SECS` (default 300)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: Option<String>,
    pub jwks_url: String,
    pub secret: Option<String>,
    pub leeway_secs: u64,
}

impl JwtConfig {
    /// Verification against the provider's published signing keys.
    pub fn with_issuer(issuer: impl Into<String>) -> Self {
        let issuer = issuer.into().trim_end_matches('/').to_string();
        Self {
            jwks_url: format!("{issuer}/protocol/openid-connect/certs"),
            issuer,
            audience: None,
            secret: None,
            leeway_secs: 300,
        }
    }

    /// Verification with a shared HS256 secret, for local development and tests.
    pub fn with_secret(issuer: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Self::with_issuer(issuer)
        }
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let issuer = env_optional("JWT_ISSUER")
            .or_else(|| env_optional("IDP_AUTHORITY"))
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_ISSUER".to_string()))?;

        let mut config = Self::with_issuer(issuer);

        if let Some(url) = env_optional("JWT_JWKS_URL") {
            config.jwks_url = url;
        }
        config.audience = env_optional("JWT_AUDIENCE");
        config.leeway_secs = env_parse("JWT_CLOCK_SKEW_SECS", "300")?;

        if let Some(secret) = env_optional("JWT_SECRET") {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::ParseError {
                    key: "JWT_SECRET".to_string(),
                    details: format!(
                        "must be at least {MIN_SECRET_LEN} characters (got {})",
                        secret.len()
                    ),
                });
            }
            config.secret = Some(secret);
        }

        Ok(config)
    }
}
