/// Database models for Taskdeck
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and credential verification
/// - `task`: Personal task records, owner-scoped
///
/// # Example
///
/// ```no_run
/// use taskdeck_core::models::user::{NewUser, User};
/// use taskdeck_core::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(
///     &pool,
///     NewUser {
///         name: "Alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};

pub mod task;
pub mod user;

/// A single field-level validation failure
///
/// Collected per form submission and handed to the render layer so the form
/// can be re-rendered with messages next to the offending fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Field that failed validation
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
