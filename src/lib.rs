use crate::gateway::Gateways;
use crate::model::{DbConnection, ModelManager};
use crate::utils::signal::shutdown_signal;
use crate::web::Storefront;
use crate::{error::AppResult, web::AppState};
use axum::Router;
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod error;
pub mod gateway;
pub mod model;
pub mod utils;
pub mod web;

static APPLICATION_NAME: &str = "coursemart";

static MIGRATOR: Migrator = sqlx::migrate!();

fn storefront(config: &Config) -> Storefront {
    Storefront {
        public_url: config.app().public_url().to_string(),
        currency: config.payment().currency().to_string(),
    }
}

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = config::Config::get_or_init(use_local).await;

    let db = DbConnection::connect(config.app().database_uri())?;

    tracing::debug!("applying migrations...");
    MIGRATOR
        .run(db.pool())
        .await
        .map_err(model::DatabaseError::from)?;

    let gateways = Gateways::from_config(config)?;
    let state = AppState::new(ModelManager::new(db), gateways, storefront(config));
    let app = web::routes::build_app(state.clone(), config);
    Ok((state, app))
}

/// Same as [`build_server`] over an already migrated pool with caller supplied gateways.
pub async fn build_server_with_pool(
    db: DbConnection,
    gateways: Gateways,
) -> AppResult<(AppState, Router)> {
    let config = config::Config::get_or_init(true).await;

    let state = AppState::new(ModelManager::new(db), gateways, storefront(config));
    let app = web::routes::build_app(state.clone(), config);
    Ok((state, app))
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (_, app) = build_server().await?;
    let config = Config::get_or_init(false).await;
    let listener = TcpListener::bind(config.host().bindto()).await?;

    tracing::info!("axum is starting at: {}", config.host().bindto());
    let axum_handle = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    axum_handle.await?;
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
