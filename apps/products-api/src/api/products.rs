//! Products API routes

use axum::Router;
use axum_helpers::JwtAuth;
use domain_products::{PgProductRepository, ProductService, handlers};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    let service = ProductService::new(PgProductRepository::new(state.db.clone()));
    let auth = JwtAuth::new(state.config.jwt.clone());
    handlers::router(service, auth)
}
