/// Authentication utilities for Taskdeck
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`session`]: Session identity, flash messages, and return-to handling
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations; hashing
///   and verification are dispatched to the blocking thread pool so a slow
///   hash never stalls unrelated request handling
/// - **Session Fixation Defense**: the session id is regenerated on login
/// - **No Enumeration**: credential failures use one indistinguishable error
///   whether the email is unknown or the password is wrong
///
/// # Example
///
/// ```no_run
/// use taskdeck_core::auth::password;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = password::hash("user_password".to_string()).await?;
/// assert!(password::verify("user_password".to_string(), hash).await?);
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod session;
