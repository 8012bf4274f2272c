//! API routes module

pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Routes nested under `/api`
pub fn routes(state: &AppState) -> eyre::Result<Router> {
    Ok(Router::new().nest("/auth", auth::router(state)?))
}
