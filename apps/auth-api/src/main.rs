//! Auth API - identity provider front door and user profiles

use std::time::Duration;

use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{connect_from_config_with_retry, run_migrations};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to PostgreSQL");
    let db = connect_from_config_with_retry(config.database.clone(), None).await?;

    if config.run_migrations {
        run_migrations::<migration::Migrator>(&db, config.app.name).await?;
    }

    let state = AppState {
        config: config.clone(),
        db,
    };

    info!(
        authority = %config.identity_provider.authority,
        client_id = %config.identity_provider.client_id,
        "Delegating sign-in to identity provider"
    );

    let router = create_router::<openapi::ApiDoc>(api::routes(&state)?, &config.cors_allowed_origin)?
        .merge(health_router(config.app))
        .merge(api::health::router(state.clone()));

    info!(
        "Starting {} v{} on port {}",
        config.app.name, config.app.version, config.server.port
    );

    let db = state.db.clone();
    create_production_app(router, &config.server, Duration::from_secs(30), async move {
        info!("Shutting down: closing PostgreSQL pool");
        if let Err(e) = db.close().await {
            tracing::warn!("Error closing PostgreSQL pool: {}", e);
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Auth API shutdown complete");
    Ok(())
}
