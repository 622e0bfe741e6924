/// Common test utilities for integration tests
///
/// Provides two ways to build the application:
///
/// - [`surface_app`]: a router over a lazy (never-connected) pool and an
///   in-memory session store. Good for exercising the middleware chain and
///   every code path that does not reach the database.
/// - [`db_app`]: a router over a real pool from `DATABASE_URL` with
///   migrations applied. Used by the `#[ignore]`d end-to-end tests.
///
/// Plus small helpers for driving the router and carrying the session
/// cookie between requests.

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use taskdeck_web::app::{build_router, AppState};
use taskdeck_web::config::{AppConfig, Config, DatabaseConfig, ServerConfig};
use taskdeck_web::render::DataRenderer;

pub fn test_config(csrf_disabled: bool) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost:1/taskdeck_unreachable".to_string()),
            max_connections: 5,
        },
        app: AppConfig {
            production: false,
            csrf_disabled,
        },
    }
}

/// Router over a lazy pool; nothing connects until a handler touches the db
#[allow(dead_code)]
pub fn surface_app(csrf_disabled: bool) -> Router {
    let config = test_config(csrf_disabled);
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");

    let state = AppState::new(pool, config, Arc::new(DataRenderer));
    build_router(state, SessionManagerLayer::new(MemoryStore::default()))
}

/// Router over a real database from `DATABASE_URL`, migrated
#[allow(dead_code)]
pub async fn db_app(csrf_disabled: bool) -> anyhow::Result<(Router, sqlx::PgPool)> {
    let config = test_config(csrf_disabled);
    let pool = sqlx::PgPool::connect(&config.database.url).await?;
    taskdeck_core::db::migrations::run_migrations(&pool).await?;

    let state = AppState::new(pool.clone(), config, Arc::new(DataRenderer));
    let app = build_router(state, SessionManagerLayer::new(MemoryStore::default()));
    Ok((app, pool))
}

/// Drives one GET request, optionally with a session cookie
pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Drives one urlencoded POST request, optionally with a session cookie
pub async fn post_form(
    app: &Router,
    uri: &str,
    body: &str,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

/// Extracts the session cookie pair from a response, if one was set
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Parses a JSON response body
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Asserts a redirect and returns its target
#[allow(dead_code)]
pub fn redirect_target(response: &Response<Body>) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect without location header")
        .to_string()
}
