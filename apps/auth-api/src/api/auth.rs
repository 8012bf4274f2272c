//! Auth API routes

use axum::Router;
use axum_helpers::JwtAuth;
use domain_auth::{AuthService, KeycloakClient, PgUserRepository, handlers};

use crate::state::AppState;

pub fn router(state: &AppState) -> eyre::Result<Router> {
    let provider = KeycloakClient::new(state.config.identity_provider.clone())?;
    let service = AuthService::new(PgUserRepository::new(state.db.clone()), provider);
    let auth = JwtAuth::new(state.config.jwt.clone());
    Ok(handlers::router(service, auth))
}
