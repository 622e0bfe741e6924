/// Access guard for task operations
///
/// [`CurrentUser`] is the authentication gate: every handler that operates on
/// tasks takes it as an extractor. It resolves the request's session to a
/// full user record; when that fails the rejection captures the originally
/// requested path as the session's return-to target, flashes a prompt, and
/// redirects to the login page.
///
/// Ownership gating is the second half of the guard and lives with the data:
/// `Task::find_for_owner`, `Task::update`, and `Task::delete` are all scoped
/// by owner, and handlers surface one merged "not found or no permission"
/// message for both failure cases.
///
/// # Example
///
/// ```no_run
/// use taskdeck_web::middleware::auth::CurrentUser;
///
/// async fn protected_handler(CurrentUser(user): CurrentUser) -> String {
///     format!("Hello, {}!", user.name)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use taskdeck_core::auth::session::{AuthSession, FlashKind, SessionError};
use taskdeck_core::models::user::User;

use crate::app::AppState;

/// The authenticated user behind the current session
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Rejection for [`CurrentUser`]
#[derive(Debug)]
pub enum AuthRejection {
    /// No authenticated identity; redirect to login
    Unauthenticated,

    /// Session or database failure while resolving
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => Redirect::to("/auth/login").into_response(),
            AuthRejection::Internal => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again.",
            )
                .into_response(),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            tracing::error!("Session layer missing from middleware stack");
            return Err(AuthRejection::Internal);
        };
        let auth = AuthSession::new(session);

        match auth.resolve_user(&state.db).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                // Remember where the visitor was headed so login can send
                // them back, then prompt.
                let original = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| parts.uri.path().to_string());

                if let Err(e) = auth.set_return_to(&original).await {
                    tracing::warn!("Failed to record return-to target: {}", e);
                }
                if let Err(e) = auth
                    .flash(FlashKind::Error, "Please log in to access this page")
                    .await
                {
                    tracing::warn!("Failed to queue flash message: {}", e);
                }

                Err(AuthRejection::Unauthenticated)
            }
            Err(e) => {
                tracing::error!("Failed to resolve session identity: {}", e);
                Err(AuthRejection::Internal)
            }
        }
    }
}

/// Bounces already-authenticated visitors away from the login/register pages
///
/// Returns the redirect to issue, or `None` when the session is anonymous.
pub async fn redirect_if_authenticated(
    auth: &AuthSession,
) -> Result<Option<Redirect>, SessionError> {
    if auth.user_id().await?.is_some() {
        auth.flash(FlashKind::Info, "You are already logged in").await?;
        Ok(Some(Redirect::to("/tasks")))
    } else {
        Ok(None)
    }
}
