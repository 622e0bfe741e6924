//! # Taskdeck Web Server
//!
//! Multi-user task tracking: users register, authenticate via a session
//! cookie, and manage personal tasks with search, filter, and sort.
//!
//! ## Architecture
//!
//! The server is built with Axum and provides:
//! - Cookie-session authentication (tower-sessions over PostgreSQL)
//! - Owner-scoped task CRUD with a composed filter/sort query
//! - CSRF protection and security headers
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskdeck cargo run -p taskdeck-web
//! ```

use anyhow::Context;
use std::sync::Arc;
use time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdeck_core::db::migrations::run_migrations;
use taskdeck_core::db::pool::{close_pool, create_pool, DatabaseConfig};
use taskdeck_web::app::{build_router, AppState};
use taskdeck_web::config::Config;
use taskdeck_web::render::DataRenderer;

/// Sessions expire after this inactivity window
const SESSION_INACTIVITY_DAYS: i64 = 7;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdeck_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Taskdeck v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    // An unreachable store is fatal here, before the server binds
    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("database unavailable at startup")?;

    run_migrations(&pool)
        .await
        .context("database migrations failed")?;

    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .context("session store migration failed")?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.app.production)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_INACTIVITY_DAYS)));

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config, Arc::new(DataRenderer));
    let app = build_router(state, session_layer);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
