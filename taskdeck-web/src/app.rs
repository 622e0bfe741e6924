/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdeck_web::{app::{build_router, AppState}, config::Config, render::DataRenderer};
/// use tower_sessions::{MemoryStore, SessionManagerLayer};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = sqlx::PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Arc::new(DataRenderer));
///
/// let session_layer = SessionManagerLayer::new(MemoryStore::default());
/// let app = build_router(state, session_layer);
/// # Ok(())
/// # }
/// ```

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Level;

use crate::{config::Config, middleware::security::SecurityHeadersLayer, render::Renderer};

/// Shared application state
///
/// Cloned for each request handler via axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// View rendering seam
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            renderer,
        }
    }
}

/// Builds the complete axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                        # landing (redirects when logged in)
/// ├── GET  /health                  # liveness + DB connectivity
/// ├── /auth/
/// │   ├── GET/POST /register        # create identity, auto-login
/// │   ├── GET/POST /login           # authenticate, honor return-to
/// │   └── GET      /logout          # destroy session
/// └── /tasks/                       # all gated by CurrentUser
///     ├── GET  /                    # list/search/filter/sort
///     ├── GET  /new  POST /         # render/create
///     ├── GET  /edit/:id            # render, ownership-checked
///     ├── POST /update/:id          # update, ownership-checked
///     └── POST /delete/:id          # delete, ownership-checked
/// ```
///
/// # Middleware Stack
///
/// Outermost to innermost: security headers, request tracing, sessions,
/// CSRF. The CSRF guard must sit inside the session layer because the token
/// lives in the session record; authentication is enforced per-handler by
/// the `CurrentUser` extractor so rejections can capture a return-to target.
pub fn build_router<Store>(state: AppState, session_layer: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    use crate::routes;

    let auth_routes = Router::new()
        .route(
            "/register",
            get(routes::auth::register_form).post(routes::auth::register),
        )
        .route(
            "/login",
            get(routes::auth::login_form).post(routes::auth::login),
        )
        .route("/logout", get(routes::auth::logout));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/new", get(routes::tasks::new_task_form))
        .route("/edit/:id", get(routes::tasks::edit_task_form))
        .route("/update/:id", post(routes::tasks::update_task))
        .route("/delete/:id", post(routes::tasks::delete_task));

    Router::new()
        .route("/", get(routes::home::index))
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::csrf::csrf_guard,
        ))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SecurityHeadersLayer::new(state.config.app.production))
        .with_state(state)
}
