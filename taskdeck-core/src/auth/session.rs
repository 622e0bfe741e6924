/// Session identity for Taskdeck
///
/// [`AuthSession`] wraps a `tower_sessions::Session` and owns every piece of
/// state Taskdeck keeps in the session record:
///
/// - the authenticated user id (absent while anonymous)
/// - the "return to" URL captured when an anonymous request hits a gated
///   resource, consumed exactly once on the next successful login
/// - the flash message queue, drained on first read
///
/// A session moves `Anonymous -> Authenticated` on [`AuthSession::login`] and
/// back on [`AuthSession::logout`] or store-side expiry (detected lazily at
/// the next access). Only one identity is bound at a time; re-login replaces
/// it.
///
/// # Example
///
/// ```no_run
/// use taskdeck_core::auth::session::{AuthSession, FlashKind};
/// use tower_sessions::Session;
///
/// # async fn example(session: Session) -> Result<(), Box<dyn std::error::Error>> {
/// let auth = AuthSession::new(session);
/// auth.flash(FlashKind::Success, "Welcome back!").await?;
/// let target = auth.take_return_to().await?.unwrap_or_else(|| "/tasks".to_string());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::models::user::User;

/// Session key for the authenticated user id
const USER_ID_KEY: &str = "user_id";

/// Session key for the post-login redirect target
const RETURN_TO_KEY: &str = "return_to";

/// Session key for the flash message queue
const FLASH_KEY: &str = "flash";

/// Severity of a flash message, mirrored by the view layer's styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

/// A one-shot message carried across a redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Error type for session identity operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session store rejected a read or write
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The user lookup behind `resolve_user` failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Typed access to Taskdeck's session state
#[derive(Debug, Clone)]
pub struct AuthSession {
    session: Session,
}

impl AuthSession {
    /// Wraps a request's session
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Returns the stored identity reference, if any
    pub async fn user_id(&self) -> Result<Option<Uuid>, SessionError> {
        Ok(self.session.get::<Uuid>(USER_ID_KEY).await?)
    }

    /// Resolves the session to a full user record
    ///
    /// Returns `None` for anonymous sessions. If the referenced user no
    /// longer exists, the stale reference is cleared and the session is
    /// treated as anonymous (self-healing).
    pub async fn resolve_user(&self, pool: &PgPool) -> Result<Option<User>, SessionError> {
        let Some(id) = self.user_id().await? else {
            return Ok(None);
        };

        match User::find_by_id(pool, id).await? {
            Some(user) => Ok(Some(user)),
            None => {
                tracing::warn!(user_id = %id, "Session referenced a deleted user, clearing");
                self.session.remove::<Uuid>(USER_ID_KEY).await?;
                Ok(None)
            }
        }
    }

    /// Binds an identity to the session
    ///
    /// The session id is regenerated first so a pre-login id handed to the
    /// client can never be replayed as an authenticated one (fixation
    /// defense). Re-login simply replaces the previous identity.
    pub async fn login(&self, user: &User) -> Result<(), SessionError> {
        self.session.cycle_id().await?;
        self.session.insert(USER_ID_KEY, user.id).await?;
        Ok(())
    }

    /// Unbinds the identity and invalidates the session record
    ///
    /// The whole record is flushed from the store, not just the identity key,
    /// so the old session id is unusable afterwards. Completes before the
    /// logout response is produced.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.session.flush().await?;
        Ok(())
    }

    /// Records the URL an anonymous request attempted to reach
    pub async fn set_return_to(&self, path: &str) -> Result<(), SessionError> {
        self.session.insert(RETURN_TO_KEY, path).await?;
        Ok(())
    }

    /// Consumes the stored redirect target
    ///
    /// Returns it at most once; subsequent calls return `None` until another
    /// gated request stores a new target.
    pub async fn take_return_to(&self) -> Result<Option<String>, SessionError> {
        Ok(self.session.remove::<String>(RETURN_TO_KEY).await?)
    }

    /// Queues a flash message for the next rendered page
    pub async fn flash(
        &self,
        kind: FlashKind,
        message: impl Into<String>,
    ) -> Result<(), SessionError> {
        let mut queue: Vec<Flash> = self
            .session
            .get::<Vec<Flash>>(FLASH_KEY)
            .await?
            .unwrap_or_default();
        queue.push(Flash {
            kind,
            message: message.into(),
        });
        self.session.insert(FLASH_KEY, queue).await?;
        Ok(())
    }

    /// Drains the flash queue
    ///
    /// Messages are single-read: the queue is empty after this call.
    pub async fn take_flashes(&self) -> Result<Vec<Flash>, SessionError> {
        Ok(self
            .session
            .remove::<Vec<Flash>>(FLASH_KEY)
            .await?
            .unwrap_or_default())
    }
}
