/// Anti-forgery token middleware
///
/// Issues one random token per session and verifies it on every
/// state-changing request. Forms carry the token in a `_csrf` field;
/// programmatic clients may send the `x-csrf-token` header instead. The
/// token is exposed to handlers through the [`CsrfToken`] request extension
/// so they can place it in the render data bag.
///
/// Verification can be disabled globally with `CSRF_DISABLED=true` for test
/// environments; handlers behave identically either way (they always receive
/// a [`CsrfToken`], empty when disabled).
///
/// Must be layered inside the session layer: the token lives in the session
/// record.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::app::AppState;

/// Session key for the anti-forgery token
const CSRF_SESSION_KEY: &str = "csrf_token";

/// Form field carrying the token
const CSRF_FORM_FIELD: &str = "_csrf";

/// Header carrying the token
const CSRF_HEADER: &str = "x-csrf-token";

/// Upper bound on a buffered form body
const MAX_FORM_BYTES: usize = 64 * 1024;

/// The per-session anti-forgery token, inserted for every request
#[derive(Debug, Clone)]
pub struct CsrfToken(pub String);

/// Error type for CSRF verification
#[derive(Debug, thiserror::Error)]
pub enum CsrfError {
    /// Token missing or mismatched on a protected request
    #[error("Invalid or missing CSRF token")]
    Rejected,

    /// Session store failure
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The session layer is not in the middleware stack
    #[error("Session layer missing")]
    MissingSessionLayer,

    /// The request body could not be buffered
    #[error("Failed to read request body")]
    BodyRead,
}

impl IntoResponse for CsrfError {
    fn into_response(self) -> Response {
        match self {
            CsrfError::Rejected => {
                (StatusCode::FORBIDDEN, "Invalid or missing CSRF token").into_response()
            }
            other => {
                tracing::error!("CSRF middleware failure: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.",
                )
                    .into_response()
            }
        }
    }
}

/// CSRF middleware entry point
///
/// On safe methods: ensures a session token exists and exposes it. On
/// protected methods (POST/PUT/PATCH/DELETE): additionally verifies the
/// presented token before the request reaches a handler.
pub async fn csrf_guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, CsrfError> {
    if state.config.app.csrf_disabled {
        req.extensions_mut().insert(CsrfToken(String::new()));
        return Ok(next.run(req).await);
    }

    let Some(session) = req.extensions().get::<Session>().cloned() else {
        tracing::error!("Session layer missing from middleware stack");
        return Err(CsrfError::MissingSessionLayer);
    };

    let token = match session.get::<String>(CSRF_SESSION_KEY).await? {
        Some(token) => token,
        None => {
            let token = Uuid::new_v4().simple().to_string();
            session.insert(CSRF_SESSION_KEY, token.clone()).await?;
            token
        }
    };

    if is_protected(req.method()) {
        let (presented, restored) = presented_token(req).await?;
        req = restored;

        if presented.as_deref() != Some(token.as_str()) {
            tracing::warn!(path = %req.uri().path(), "Rejected request with bad CSRF token");
            return Err(CsrfError::Rejected);
        }
    }

    req.extensions_mut().insert(CsrfToken(token));
    Ok(next.run(req).await)
}

/// Methods that must present a token
fn is_protected(method: &Method) -> bool {
    *method == Method::POST
        || *method == Method::PUT
        || *method == Method::PATCH
        || *method == Method::DELETE
}

/// Extracts the presented token from the header or a urlencoded form body
///
/// Buffers the body to read the form field, then rebuilds the request so the
/// handler's own `Form` extractor still works.
async fn presented_token(req: Request) -> Result<(Option<String>, Request), CsrfError> {
    if let Some(header) = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    {
        return Ok((Some(header), req));
    }

    let is_form = req
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if !is_form {
        return Ok((None, req));
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|_| CsrfError::BodyRead)?;

    let presented = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
        .ok()
        .and_then(|pairs| {
            pairs
                .into_iter()
                .find(|(key, _)| key == CSRF_FORM_FIELD)
                .map(|(_, value)| value)
        });

    let restored = Request::from_parts(parts, Body::from(bytes));
    Ok((presented, restored))
}
