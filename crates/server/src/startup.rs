use std::net::SocketAddr;

use axum::Router;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use configs::AppConfig;
use service::{maintenance, user_service};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Schema, bootstrap admin and legacy data fixes.
pub async fn prepare_database(db: &DatabaseConnection, cfg: &AppConfig) -> Result<(), StartupError> {
    migration::Migrator::up(db, None).await.map_err(anyhow::Error::from)?;
    info!("migrations applied");
    user_service::seed_admin(db, &cfg.auth.admin_email, &cfg.auth.admin_password).await?;
    maintenance::run(db).await?;
    Ok(())
}

/// Router wired with state, CORS and tracing.
pub fn build_app(db: DatabaseConnection, cfg: &AppConfig) -> Router {
    let state = ServerState::new(db, &cfg.auth.jwt_secret, cfg.auth.token_ttl_secs, &cfg.auth.card_secret);
    routes::build_router(build_cors(), state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    info!(service = "server", event = "shutdown_signal", "received Ctrl+C, shutting down");
}

/// Public entry: prepare the database, build the app and serve until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let cfg = AppConfig::load_or_env()?;
    let db = models::db::connect_with_config(&cfg.database).await?;
    prepare_database(&db, &cfg).await?;

    let app = build_app(db, &cfg);
    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
