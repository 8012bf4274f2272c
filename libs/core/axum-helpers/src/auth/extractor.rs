use super::jwt::JwtClaims;
use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};

/// The authenticated caller, as established by
/// [`jwt_auth_middleware`](super::jwt_auth_middleware).
///
/// Rejects with 401 when the middleware did not run or the token has no subject.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub JwtClaims);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.sub
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<JwtClaims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "Token does not identify a user".to_string(),
            ));
        }

        Ok(CurrentUser(claims))
    }
}
