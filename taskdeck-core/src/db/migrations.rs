/// Database migration runner
///
/// Migrations live in the `migrations/` directory at the workspace root and
/// are embedded into the binary at compile time via `sqlx::migrate!`. Each
/// file is a plain "up" migration named `{version}_{name}.sql`.
///
/// # Example
///
/// ```no_run
/// use taskdeck_core::db::migrations::run_migrations;
/// use taskdeck_core::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

use sqlx::PgPool;
use tracing::info;

/// Embedded migrator for the workspace `migrations/` directory
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../migrations");

/// Runs all pending database migrations
///
/// Safe to call on every startup; already-applied migrations are skipped.
///
/// # Errors
///
/// Returns an error if a migration fails to apply or the migrations table
/// cannot be created.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");
    MIGRATOR.run(pool).await?;
    info!("Database migrations up to date");
    Ok(())
}
