mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use huddle_api::auth::{AppState, AppStateInner};
use huddle_db::Database;
use huddle_engine::{Engine, JwtIdentity};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // Init database
    let db = Database::open(&config.db_path)?;
    info!("Using database at {}", config.db_path.display());

    // Shared state
    let identity = Arc::new(JwtIdentity::new(config.jwt_secret.clone()).with_ttl(config.token_ttl()));
    let engine = Engine::new(Arc::new(db), identity.clone());
    let app_state: AppState = Arc::new(AppStateInner { engine, identity });

    let app = huddle_api::router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Huddle server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
