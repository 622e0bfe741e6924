/// Error handling for the web server
///
/// Handlers return `Result<T, WebError>`. The user-correctable outcomes
/// (validation failures, duplicate email, bad credentials, missing task) are
/// handled inline by the handlers so they can flash a message and preserve
/// form input; what reaches this type is the fallthrough: infrastructure
/// failures and the races the inline paths cannot see. `IntoResponse` is the
/// single top-level handler: it logs and produces a user-safe response, with
/// detail included only in debug builds.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use taskdeck_core::auth::password::PasswordError;
use taskdeck_core::auth::session::SessionError;
use taskdeck_core::models::user::CredentialError;
use taskdeck_core::models::Violation;

/// Handler result type alias
pub type WebResult<T> = Result<T, WebError>;

/// Unified web error type
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Email already registered; surfaced by the unique constraint when the
    /// pre-insert check loses the race
    #[error("An account with this email already exists")]
    DuplicateEmail,

    /// Credential verification failed in a way the login handler did not
    /// translate inline
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Session store failure
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Password hashing failure
    #[error("Password operation failed: {0}")]
    Password(#[from] PasswordError),

    /// Database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for WebError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            // Unique constraint on users.email
            if let Some(constraint) = db_err.constraint() {
                if constraint.contains("email") {
                    return WebError::DuplicateEmail;
                }
            }
        }
        WebError::Database(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            // The registration handler flashes before redirecting in the
            // common path; this covers the insert race.
            WebError::DuplicateEmail => Redirect::to("/auth/register").into_response(),

            WebError::Credentials(CredentialError::InvalidCredentials) => {
                Redirect::to("/auth/login").into_response()
            }

            other => {
                tracing::error!("Unhandled error: {}", other);

                let message = if cfg!(debug_assertions) {
                    format!("Something went wrong: {}", other)
                } else {
                    "Something went wrong. Please try again.".to_string()
                };

                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

/// Flattens `validator` derive errors into field violations
///
/// Used by the auth forms to re-render with a message next to each offending
/// field.
pub fn violations_from(errors: &validator::ValidationErrors) -> Vec<Violation> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                Violation::new(
                    field.to_string(),
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
        name: String,
        #[validate(email(message = "Please provide a valid email"))]
        email: String,
    }

    #[test]
    fn test_violations_from_flattens_field_errors() {
        let probe = Probe {
            name: "a".to_string(),
            email: "not-an-email".to_string(),
        };

        let errors = probe.validate().unwrap_err();
        let violations = violations_from(&errors);

        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .any(|v| v.field == "name" && v.message.contains("at least 2")));
        assert!(violations
            .iter()
            .any(|v| v.field == "email" && v.message.contains("valid email")));
    }

    #[test]
    fn test_duplicate_email_redirects_to_register() {
        let response = WebError::DuplicateEmail.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/auth/register"
        );
    }

    #[test]
    fn test_internal_errors_return_500() {
        let response = WebError::Database(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
