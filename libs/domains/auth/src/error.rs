use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Account is locked until {}", .0.to_rfc3339())]
    AccountLocked(DateTime<Utc>),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    WeakPassword(String),

    #[error("Invalid or expired password reset token")]
    InvalidResetToken,

    /// Operation name of a password-based endpoint that moved to the identity provider.
    #[error("{0} is now handled through the identity provider. Please use the OAuth2/OIDC flow.")]
    LegacyEndpoint(&'static str),

    #[error("{0}")]
    IdentityProvider(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn user_not_found() -> Self {
        AuthError::NotFound("User not found".to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotFound(msg) => AppError::NotFound(msg),
            AuthError::Conflict(msg) => AppError::Conflict(msg),
            AuthError::InvalidCredentials => AppError::Unauthorized(err.to_string()),
            AuthError::AccountDisabled | AuthError::AccountLocked(_) => {
                AppError::Forbidden(err.to_string())
            }
            AuthError::Validation(errors) => AppError::ValidationError(errors),
            AuthError::WeakPassword(msg) => AppError::BadRequest(msg),
            AuthError::InvalidResetToken => AppError::BadRequest(err.to_string()),
            AuthError::LegacyEndpoint(_) => AppError::BadRequest(err.to_string()),
            AuthError::IdentityProvider(msg) => AppError::BadGateway(msg),
            AuthError::Database(db) => AppError::Database(db),
            AuthError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::user_not_found(), StatusCode::NOT_FOUND),
            (AuthError::Conflict("taken".into()), StatusCode::CONFLICT),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::AccountDisabled, StatusCode::FORBIDDEN),
            (AuthError::AccountLocked(Utc::now()), StatusCode::FORBIDDEN),
            (AuthError::WeakPassword("short".into()), StatusCode::BAD_REQUEST),
            (AuthError::InvalidResetToken, StatusCode::BAD_REQUEST),
            (AuthError::LegacyEndpoint("Login"), StatusCode::BAD_REQUEST),
            (AuthError::IdentityProvider("down".into()), StatusCode::BAD_GATEWAY),
            (AuthError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_legacy_message() {
        let err = AuthError::LegacyEndpoint("User registration");
        assert_eq!(
            err.to_string(),
            "User registration is now handled through the identity provider. Please use the OAuth2/OIDC flow."
        );
    }
}
