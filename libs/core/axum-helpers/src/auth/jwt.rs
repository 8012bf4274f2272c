use super::config::JwtConfig;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    jwk::{JwkSet, KeyAlgorithm, PublicKeyUse},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Unknown key ids trigger at most one JWKS fetch per interval.
pub const MIN_JWKS_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token header has no key id")]
    MissingKeyId,

    #[error("No signing key with id '{0}'")]
    UnknownKey(String),

    #[error("Failed to fetch signing keys: {0}")]
    Jwks(String),

    #[error("Token algorithm {0:?} is not allowed for this key")]
    AlgorithmNotAllowed(Algorithm),

    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// `aud` is a string or an array depending on the client setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims of an identity-provider access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject, the provider's user id. Empty when the token carries none.
    #[serde(default)]
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RealmAccess>,
}

impl JwtClaims {
    /// Claims for `sub` issued now and valid for `ttl_secs`.
    pub fn new(sub: impl Into<String>, issuer: impl Into<String>, ttl_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: sub.into(),
            exp: now + ttl_secs,
            iat: now,
            iss: Some(issuer.into()),
            aud: None,
            email: None,
            preferred_username: None,
            realm_access: None,
        }
    }

    pub fn roles(&self) -> &[String] {
        self.realm_access
            .as_ref()
            .map(|access| access.roles.as_slice())
            .unwrap_or(&[])
    }
}

/// A published verification key and the algorithm its JWK names, if any.
#[derive(Clone)]
struct SigningKey {
    key: DecodingKey,
    algorithm: Option<Algorithm>,
}

#[derive(Default)]
struct JwksCache {
    keys: HashMap<String, SigningKey>,
    fetched_at: Option<Instant>,
}

#[derive(Clone)]
enum KeySource {
    Secret(DecodingKey),
    Jwks {
        url: String,
        http: reqwest::Client,
        cache: Arc<RwLock<JwksCache>>,
    },
}

/// Verifies bearer tokens for issuer, audience, expiry and signature.
///
/// Signing keys come from the provider's JWKS endpoint and are cached by `kid`.
/// An unknown `kid` refetches the set so key rotation is picked up, but no more than
/// once per [`MIN_JWKS_REFETCH_INTERVAL`]. The algorithm is taken from the JWK when it
/// names one; otherwise the token's own `alg` is accepted unless it is an HMAC one.
#[derive(Clone)]
pub struct JwtAuth {
    config: Arc<JwtConfig>,
    keys: KeySource,
}

impl JwtAuth {
    pub fn new(config: JwtConfig) -> Self {
        let keys = match &config.secret {
            Some(secret) => {
                tracing::info!("Bearer tokens verified with shared HS256 secret");
                KeySource::Secret(DecodingKey::from_secret(secret.as_bytes()))
            }
            None => {
                tracing::info!(jwks_url = %config.jwks_url, "Bearer tokens verified against JWKS");
                KeySource::Jwks {
                    url: config.jwks_url.clone(),
                    http: reqwest::Client::new(),
                    cache: Arc::new(RwLock::new(JwksCache::default())),
                }
            }
        };

        Self {
            config: Arc::new(config),
            keys,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = self.config.leeway_secs;
        validation.set_issuer(&[self.config.issuer.as_str()]);
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }
        validation
    }

    pub async fn verify(&self, token: &str) -> Result<JwtClaims, TokenError> {
        match &self.keys {
            KeySource::Secret(key) => {
                let data = decode::<JwtClaims>(token, key, &self.validation(Algorithm::HS256))?;
                Ok(data.claims)
            }
            KeySource::Jwks { url, http, cache } => {
                let header = decode_header(token)?;
                let kid = header.kid.ok_or(TokenError::MissingKeyId)?;

                let cached = cache.read().await.keys.get(&kid).cloned();
                let signing = match cached {
                    Some(signing) => signing,
                    None => refresh_for(cache, http, url, &kid).await?,
                };

                let algorithm = allowed_algorithm(signing.algorithm, header.alg)?;
                let data = decode::<JwtClaims>(token, &signing.key, &self.validation(algorithm))?;
                Ok(data.claims)
            }
        }
    }
}

/// Looks `kid` up again after refetching the key set, unless a fetch happened within
/// [`MIN_JWKS_REFETCH_INTERVAL`].
async fn refresh_for(
    cache: &RwLock<JwksCache>,
    http: &reqwest::Client,
    url: &str,
    kid: &str,
) -> Result<SigningKey, TokenError> {
    let mut guard = cache.write().await;

    // Another request may have refreshed while this one waited for the lock.
    if let Some(signing) = guard.keys.get(kid) {
        return Ok(signing.clone());
    }

    if guard
        .fetched_at
        .is_some_and(|at| at.elapsed() < MIN_JWKS_REFETCH_INTERVAL)
    {
        tracing::debug!(kid, "Unknown key id, JWKS refetch throttled");
        return Err(TokenError::UnknownKey(kid.to_string()));
    }

    guard.fetched_at = Some(Instant::now());
    guard.keys = fetch_jwks(http, url).await?;
    guard
        .keys
        .get(kid)
        .cloned()
        .ok_or_else(|| TokenError::UnknownKey(kid.to_string()))
}

/// Algorithm to verify with: the key's own when it names one, else the token's
/// asymmetric `alg`.
fn allowed_algorithm(
    pinned: Option<Algorithm>,
    requested: Algorithm,
) -> Result<Algorithm, TokenError> {
    match pinned {
        Some(algorithm) if algorithm == requested => Ok(algorithm),
        Some(_) => Err(TokenError::AlgorithmNotAllowed(requested)),
        None if matches!(
            requested,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) =>
        {
            Err(TokenError::AlgorithmNotAllowed(requested))
        }
        None => Ok(requested),
    }
}

/// Signature algorithm named by a JWK `alg`; `None` for encryption algorithms.
fn signing_algorithm(algorithm: &KeyAlgorithm) -> Option<Algorithm> {
    match algorithm {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

async fn fetch_jwks(
    http: &reqwest::Client,
    url: &str,
) -> Result<HashMap<String, SigningKey>, TokenError> {
    let set: JwkSet = http
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| TokenError::Jwks(e.to_string()))?
        .json()
        .await
        .map_err(|e| TokenError::Jwks(e.to_string()))?;

    let mut keys = HashMap::new();
    for jwk in &set.keys {
        let Some(kid) = jwk.common.key_id.clone() else {
            continue;
        };
        if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
            continue;
        }
        let algorithm = match &jwk.common.key_algorithm {
            None => None,
            Some(named) => match signing_algorithm(named) {
                Some(algorithm) => Some(algorithm),
                None => {
                    tracing::debug!(kid = %kid, ?named, "Skipping non-signing key");
                    continue;
                }
            },
        };
        match DecodingKey::from_jwk(jwk) {
            Ok(key) => {
                keys.insert(kid, SigningKey { key, algorithm });
            }
            Err(e) => tracing::warn!(kid = %kid, "Skipping unusable signing key: {}", e),
        }
    }

    tracing::debug!(count = keys.len(), "Loaded signing keys");
    Ok(keys)
}

/// Signs claims with a shared HS256 secret.
///
/// Pairs with [`JwtConfig::with_secret`] for local development and tests;
/// production tokens are always minted by the identity provider.
pub fn encode_hs256(claims: &JwtClaims, secret: &str) -> Result<String, TokenError> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &str = "an-hs256-secret-that-is-long-enough!";
    const ISSUER: &str = "http://localhost:8180/realms/shop";

    fn claims(exp_offset: i64) -> JwtClaims {
        let now = Utc::now().timestamp();
        JwtClaims {
            sub: "user-1".to_string(),
            exp: now + exp_offset,
            iat: now,
            iss: Some(ISSUER.to_string()),
            aud: Some(Audience::Many(vec!["account".into(), "storefront".into()])),
            email: Some("ada@example.com".to_string()),
            preferred_username: Some("ada".to_string()),
            realm_access: Some(RealmAccess {
                roles: vec!["User".to_string()],
            }),
        }
    }

    #[tokio::test]
    async fn test_valid_token_round_trips_claims() {
        let auth = JwtAuth::new(JwtConfig::with_secret(ISSUER, SECRET));
        let token = encode_hs256(&claims(600), SECRET).unwrap();

        let verified = auth.verify(&token).await.unwrap();
        assert_eq!(verified.sub, "user-1");
        assert_eq!(verified.roles(), ["User".to_string()]);
    }

    #[tokio::test]
    async fn test_wrong_issuer_is_rejected() {
        let auth = JwtAuth::new(JwtConfig::with_secret("http://other", SECRET));
        let token = encode_hs256(&claims(600), SECRET).unwrap();
        assert!(matches!(auth.verify(&token).await, Err(TokenError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_expiry_respects_leeway() {
        let auth = JwtAuth::new(JwtConfig::with_secret(ISSUER, SECRET));

        let recently_expired = encode_hs256(&claims(-60), SECRET).unwrap();
        assert!(auth.verify(&recently_expired).await.is_ok());

        let long_expired = encode_hs256(&claims(-3600), SECRET).unwrap();
        assert!(auth.verify(&long_expired).await.is_err());
    }

    #[tokio::test]
    async fn test_audience_checked_when_configured() {
        let token = encode_hs256(&claims(600), SECRET).unwrap();

        let matching = JwtAuth::new(JwtConfig::with_secret(ISSUER, SECRET).audience("storefront"));
        assert!(matching.verify(&token).await.is_ok());

        let other = JwtAuth::new(JwtConfig::with_secret(ISSUER, SECRET).audience("admin"));
        assert!(other.verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_bad_signature_is_rejected() {
        let auth = JwtAuth::new(JwtConfig::with_secret(ISSUER, SECRET));
        let token = encode_hs256(&claims(600), "a-completely-different-secret-value").unwrap();
        assert!(auth.verify(&token).await.is_err());
    }

    /// The key lookup fails before the signature is ever checked.
    fn token_with_kid(kid: &str) -> String {
        let header = Header {
            kid: Some(kid.to_string()),
            ..Header::new(Algorithm::HS256)
        };
        encode(&header, &claims(600), &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_key_ids_refetch_at_most_once_per_interval() {
        let mut config = JwtConfig::with_issuer(ISSUER);
        config.jwks_url = "http://127.0.0.1:9/certs".to_string();
        let auth = JwtAuth::new(config);

        let first = auth.verify(&token_with_kid("kid-1")).await;
        assert!(matches!(first, Err(TokenError::Jwks(_))), "{first:?}");

        // Within the interval no request is made, so the provider being down is not seen.
        let second = auth.verify(&token_with_kid("kid-2")).await;
        assert!(matches!(second, Err(TokenError::UnknownKey(kid)) if kid == "kid-2"));
    }

    #[test]
    fn test_key_algorithm_is_pinned() {
        assert_eq!(
            allowed_algorithm(Some(Algorithm::RS256), Algorithm::RS256).unwrap(),
            Algorithm::RS256
        );
        assert!(matches!(
            allowed_algorithm(Some(Algorithm::RS256), Algorithm::PS256),
            Err(TokenError::AlgorithmNotAllowed(Algorithm::PS256))
        ));
        assert!(allowed_algorithm(None, Algorithm::HS256).is_err());
        assert_eq!(
            allowed_algorithm(None, Algorithm::ES256).unwrap(),
            Algorithm::ES256
        );
        assert_eq!(signing_algorithm(&KeyAlgorithm::RS256), Some(Algorithm::RS256));
        assert_eq!(signing_algorithm(&KeyAlgorithm::RSA_OAEP), None);
    }

    #[tokio::test]
    async fn test_jwks_mode_requires_key_id() {
        let auth = JwtAuth::new(JwtConfig::with_issuer(ISSUER));
        let token = encode_hs256(&claims(600), SECRET).unwrap();
        assert!(matches!(auth.verify(&token).await, Err(TokenError::MissingKeyId)));
    }
}
