/// User model and database operations
///
/// This module provides the User model and credential verification.
/// Passwords are stored as Argon2id hashes, never in plaintext, and the hash
/// is excluded from serialized output.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(50) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Emails are lowercased before every insert and lookup, so the unique
/// constraint behaves case-insensitively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::{self, PasswordError};

/// User model representing an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name (2-50 characters)
    pub name: String,

    /// Email address, stored lowercased, unique across all users
    pub email: String,

    /// Argon2id password hash, never included in serialized output
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// `password_hash` must already be an Argon2id hash; the plaintext never
/// reaches the store layer.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Error type for credential verification
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Unknown email or wrong password; the two cases are indistinguishable
    /// by design so a caller cannot probe which emails are registered
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The stored hash could not be processed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Database error
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint
    /// violation, surfaced as a database error for the caller to map) or the
    /// database operation fails. Callers pre-check `find_by_email`; the
    /// constraint covers the residual race.
    pub async fn create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(data.name.trim())
        .bind(data.email.trim().to_lowercase())
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Verifies an email/password pair and returns the matching user
    ///
    /// Fails with [`CredentialError::InvalidCredentials`] whether the email
    /// is unknown or the password is wrong. Verification runs on the blocking
    /// thread pool.
    pub async fn verify_credentials(
        pool: &PgPool,
        email: &str,
        plaintext: &str,
    ) -> Result<Self, CredentialError> {
        let user = Self::find_by_email(pool, email)
            .await?
            .ok_or(CredentialError::InvalidCredentials)?;

        let matches =
            password::verify(plaintext.to_string(), user.password_hash.clone()).await?;

        if matches {
            Ok(user)
        } else {
            Err(CredentialError::InvalidCredentials)
        }
    }
}
