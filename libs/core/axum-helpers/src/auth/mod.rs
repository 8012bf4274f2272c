//! Bearer authentication against identity-provider access tokens.
//!
//! ```ignore
//! use axum_helpers::auth::{CurrentUser, JwtAuth, JwtConfig, jwt_auth_middleware};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(JwtConfig::from_env()?);
//!
//! async fn whoami(user: CurrentUser) -> String {
//!     user.id().to_string()
//! }
//!
//! let protected = Router::new()
//!     .route("/me", get(whoami))
//!     .route_layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod config;
pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use extractor::CurrentUser;
pub use jwt::{Audience, JwtAuth, JwtClaims, RealmAccess, TokenError, encode_hs256};
pub use middleware::{extract_token, jwt_auth_middleware};
