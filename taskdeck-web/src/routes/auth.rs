/// Authentication endpoints
///
/// Registration, login, and logout. Forms re-render with field messages and
/// the visitor's prior input on validation failure; success paths flash a
/// message and redirect. Login failures use one generic message whether the
/// email is unknown or the password is wrong.
///
/// # Endpoints
///
/// - `GET/POST /auth/register` - create identity, auto-login on success
/// - `GET/POST /auth/login` - authenticate, honor return-to
/// - `GET /auth/logout` - destroy session

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use validator::Validate;

use taskdeck_core::auth::password;
use taskdeck_core::auth::session::{AuthSession, FlashKind};
use taskdeck_core::models::user::{CredentialError, NewUser, User};
use taskdeck_core::models::Violation;

use crate::{
    app::AppState,
    error::{violations_from, WebError, WebResult},
    middleware::{auth::redirect_if_authenticated, auth::CurrentUser, csrf::CsrfToken},
};

/// Registration form fields
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    /// Checked by `validate_password_strength`, not the derive
    pub password: String,

    #[serde(default)]
    pub confirm_password: String,
}

impl RegisterForm {
    fn violations(&self) -> Vec<Violation> {
        let mut violations = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => violations_from(&errors),
        };

        if let Err(message) = password::validate_password_strength(&self.password) {
            violations.push(Violation::new("password", message));
        }

        if self.password != self.confirm_password {
            violations.push(Violation::new("confirm_password", "Passwords do not match"));
        }

        violations
    }

    /// Prior input echoed back on re-render; passwords are never echoed
    fn echo(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "email": self.email,
        })
    }
}

/// Login form fields
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// GET /auth/register
pub async fn register_form(
    State(state): State<AppState>,
    session: Session,
    Extension(csrf): Extension<CsrfToken>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);
    if let Some(redirect) = redirect_if_authenticated(&auth).await? {
        return Ok(redirect.into_response());
    }

    let flashes = auth.take_flashes().await?;
    Ok(state.renderer.render(
        "auth/register",
        json!({
            "title": "Register - Taskdeck",
            "csrf": csrf.0,
            "flashes": flashes,
            "errors": [],
            "form": {},
        }),
    ))
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Extension(csrf): Extension<CsrfToken>,
    Form(form): Form<RegisterForm>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);
    if let Some(redirect) = redirect_if_authenticated(&auth).await? {
        return Ok(redirect.into_response());
    }

    let violations = form.violations();
    if !violations.is_empty() {
        let flashes = auth.take_flashes().await?;
        let page = state.renderer.render(
            "auth/register",
            json!({
                "title": "Register - Taskdeck",
                "csrf": csrf.0,
                "flashes": flashes,
                "errors": violations,
                "form": form.echo(),
            }),
        );
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    // Pre-check for friendliness; the unique constraint covers the
    // insert race.
    if User::find_by_email(&state.db, &form.email).await?.is_some() {
        auth.flash(FlashKind::Error, "An account with this email already exists")
            .await?;
        return Ok(Redirect::to("/auth/register").into_response());
    }

    let password_hash = password::hash(form.password).await?;

    let user = match User::create(
        &state.db,
        NewUser {
            name: form.name,
            email: form.email,
            password_hash,
        },
    )
    .await
    .map_err(WebError::from)
    {
        Ok(user) => user,
        Err(WebError::DuplicateEmail) => {
            auth.flash(FlashKind::Error, "An account with this email already exists")
                .await?;
            return Ok(Redirect::to("/auth/register").into_response());
        }
        Err(other) => return Err(other),
    };

    // Log the user in automatically after registration
    auth.login(&user).await?;
    auth.flash(
        FlashKind::Success,
        format!("Welcome to Taskdeck, {}!", user.name),
    )
    .await?;

    Ok(Redirect::to("/tasks").into_response())
}

/// GET /auth/login
pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
    Extension(csrf): Extension<CsrfToken>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);
    if let Some(redirect) = redirect_if_authenticated(&auth).await? {
        return Ok(redirect.into_response());
    }

    let flashes = auth.take_flashes().await?;
    Ok(state.renderer.render(
        "auth/login",
        json!({
            "title": "Login - Taskdeck",
            "csrf": csrf.0,
            "flashes": flashes,
            "errors": [],
            "form": {},
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Extension(csrf): Extension<CsrfToken>,
    Form(form): Form<LoginForm>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);
    if let Some(redirect) = redirect_if_authenticated(&auth).await? {
        return Ok(redirect.into_response());
    }

    if let Err(errors) = form.validate() {
        let flashes = auth.take_flashes().await?;
        let page = state.renderer.render(
            "auth/login",
            json!({
                "title": "Login - Taskdeck",
                "csrf": csrf.0,
                "flashes": flashes,
                "errors": violations_from(&errors),
                "form": { "email": form.email },
            }),
        );
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    let user = match User::verify_credentials(&state.db, &form.email, &form.password).await {
        Ok(user) => user,
        Err(CredentialError::InvalidCredentials) => {
            auth.flash(FlashKind::Error, "Invalid email or password").await?;
            return Ok(Redirect::to("/auth/login").into_response());
        }
        Err(other) => return Err(other.into()),
    };

    auth.login(&user).await?;
    auth.flash(FlashKind::Success, format!("Welcome back, {}!", user.name))
        .await?;

    // Send the visitor where they were originally headed, consuming the
    // stored target.
    let target = auth
        .take_return_to()
        .await?
        .unwrap_or_else(|| "/tasks".to_string());

    Ok(Redirect::to(&target).into_response())
}

/// GET /auth/logout
///
/// Destroys the whole session record before responding; there is no window
/// in which the old session id still resolves.
pub async fn logout(CurrentUser(_user): CurrentUser, session: Session) -> WebResult<Response> {
    let auth = AuthSession::new(session);
    auth.logout().await?;

    Ok(Redirect::to("/?logged_out=true").into_response())
}
