//! Warden API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use tracing::info;
use warden_core::AppError;

use crate::api_config::{ApiCommand, ApiConfig, init_tracing};
use crate::api_services::{build_app_state, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url).await?;

    let app_state = build_app_state(&config, pool);

    match config.command {
        ApiCommand::Migrate => {
            info!("database migrations applied successfully");
            return Ok(());
        }
        ApiCommand::IssueCredential(principal_id) => {
            let credential = app_state
                .request_authenticator
                .issue_credential(principal_id)
                .await?;
            info!(
                %principal_id,
                expires_at = %credential.expires_at,
                "credential issued"
            );
            println!("{}", credential.token);
            return Ok(());
        }
        ApiCommand::Serve => {}
    }

    let app = api_router::build_router(app_state, &config.frontend_url)?;
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "warden-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
