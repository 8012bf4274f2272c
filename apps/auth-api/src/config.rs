//! Configuration for Auth API

use axum_helpers::JwtConfig;
use core_config::identity::IdentityProviderConfig;
use core_config::{AppInfo, FromEnv, app_info, env_parse, env_required, server::ServerConfig};
use database::postgres::PostgresConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: PostgresConfig,
    pub identity_provider: IdentityProviderConfig,
    pub jwt: JwtConfig,
    pub cors_allowed_origin: String,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            database: PostgresConfig::from_env()?,
            identity_provider: IdentityProviderConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            cors_allowed_origin: env_required("CORS_ALLOWED_ORIGIN")?,
            run_migrations: env_parse("RUN_MIGRATIONS", "true")?,
        })
    }
}
