//! CLI subcommands.

pub mod migrate;
pub mod status;

use foodievent_web::config::{ConfigError, get_database_url};
use foodievent_web::db::{RepositoryError, create_pool};
use sqlx::PgPool;
use thiserror::Error;

/// Environment variable holding the database URL.
const DATABASE_URL_VAR: &str = "FOODIEVENT_DATABASE_URL";

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Connect using the same variables as the web server.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url(DATABASE_URL_VAR)?;
    tracing::info!("Connecting to database...");
    Ok(create_pool(&database_url).await?)
}
