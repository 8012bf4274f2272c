//! # Axum Helpers
//!
//! Shared HTTP plumbing for the service binaries.
//!
//! - **[`auth`]**: bearer-token verification (JWKS or HS256), middleware, `CurrentUser`
//! - **[`server`]**: router assembly with API docs, health endpoints, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`errors`]**: `AppError` and the structured error body with error codes
//! - **[`extractors`]**: `ValidatedJson` and `UuidPath`
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//!
//! let router = create_router::<ApiDoc>(api_routes, &config.cors_allowed_origin)?
//!     .merge(health_router(app_info!()));
//! create_production_app(router, &config.server, Duration::from_secs(30), cleanup).await?;
//! ```

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{CurrentUser, JwtAuth, JwtClaims, JwtConfig, jwt_auth_middleware};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

pub use http::{create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use errors::responses::{
    BadGatewayResponse, BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
    ConflictResponse, InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
};

pub use extractors::{UuidPath, ValidatedJson};
