//! Auth Domain
//!
//! Sign-in, token refresh and logout are delegated to an OAuth2/OIDC identity provider
//! (Keycloak). Local user records mirror the provider's profile and carry the account
//! rules (lockout, reset tokens, password strength) for locally registered users.
//!
//! ```text
//! handlers ──► commands ──► AuthService ──┬──► UserRepository   (in-memory | PostgreSQL)
//!                                         └──► IdentityProvider (KeycloakClient)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use core_config::identity::IdentityProviderConfig;
//! use domain_auth::{handlers, AuthService, KeycloakClient, PgUserRepository};
//!
//! # fn example(db: sea_orm::DatabaseConnection) -> domain_auth::AuthResult<()> {
//! let idp = IdentityProviderConfig::new("https://sso.example.com/realms/shop", "storefront", "secret");
//! let service = AuthService::new(PgUserRepository::new(db), KeycloakClient::new(idp)?);
//! let auth = JwtAuth::new(JwtConfig::with_issuer("https://sso.example.com/realms/shop"));
//! let router = handlers::router(service, auth);
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod service;

pub use commands::{
    GetAuthorizationUrlCommand, GetLogoutUrlCommand, GetUserByIdQuery, GetUserInfoCommand,
    HandleCallbackCommand, LogoutCommand, RefreshTokenCommand, UpdateProfileCommand,
    ValidateTokenCommand,
};
pub use error::{AuthError, AuthResult};
pub use handlers::ApiDoc;
pub use identity::{IdentityProvider, KeycloakClient};
pub use models::{MAX_FAILED_LOGIN_ATTEMPTS, User};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::AuthService;
