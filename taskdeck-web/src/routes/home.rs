/// Landing page
///
/// Anonymous visitors get the welcome page with links to register and log
/// in; authenticated users are sent straight to their task list. The logout
/// flow redirects here with `?logged_out=true` because the session (and with
/// it any flash message) no longer exists at that point.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use taskdeck_core::auth::session::AuthSession;

use crate::{app::AppState, error::WebResult};

#[derive(Debug, Deserialize)]
pub struct HomeParams {
    logged_out: Option<String>,
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<HomeParams>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);

    if auth.user_id().await?.is_some() {
        return Ok(Redirect::to("/tasks").into_response());
    }

    let flashes = auth.take_flashes().await?;
    let logged_out = params.logged_out.as_deref() == Some("true");

    Ok(state.renderer.render(
        "home/index",
        json!({
            "title": "Taskdeck",
            "logged_out": logged_out,
            "flashes": flashes,
        }),
    ))
}
