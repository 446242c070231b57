//! Congress API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use axum::Router;
use congress_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, StorageBackend, init_tracing};
use crate::api_services::{
    Repositories, bootstrap_security, build_app_state, build_memory_session_layer,
    build_postgres_session_layer, connect_and_migrate,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let address = config.socket_address()?;

    let app = match config.storage_backend {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;
            let pool = connect_and_migrate(database_url).await?;

            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }

            let session_layer =
                build_postgres_session_layer(pool.clone(), config.cookie_secure).await?;
            let app_state = build_app_state(&config, Repositories::postgres(pool));
            bootstrap_security(&app_state, &config).await?;
            api_router::build_router(app_state, &config.frontend_url, session_layer)?
        }
        StorageBackend::Memory => {
            let session_layer = build_memory_session_layer(config.cookie_secure);
            let app_state = build_app_state(&config, Repositories::in_memory());
            bootstrap_security(&app_state, &config).await?;
            info!("running with in-memory storage; data is lost on shutdown");
            api_router::build_router(app_state, &config.frontend_url, session_layer)?
        }
    };

    serve(app, address).await
}

async fn serve(app: Router, address: SocketAddr) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "congress-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
