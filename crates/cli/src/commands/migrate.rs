//! Database migration command.
//!
//! Migrations live in `crates/web/migrations/` and are embedded at build time.

use super::{CommandError, connect};

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
