//! Database operations for FoodieVent `PostgreSQL`.
//!
//! # Schema: `foodievent`
//!
//! - `users` - Registered accounts
//! - `events` - Listed events with remaining ticket inventory
//! - `comments` - Comments posted on events
//! - `orders` - Ticket purchases with price snapshots
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Transactions
//!
//! Read-only lookups go through the pool-backed repositories. Ledger writes
//! use the associated functions that take a `&mut PgConnection`, so the
//! calling service decides where its transaction begins and commits.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p foodievent-cli -- migrate
//! ```

pub mod comments;
pub mod events;
pub mod orders;
pub mod status;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use comments::CommentRepository;
pub use events::EventRepository;
pub use orders::OrderRepository;
pub use status::StatusRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
///
/// The conflict carries the violated constraint's name when the server
/// reports one.
pub(crate) fn conflict_or_database(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(
            db_err
                .constraint()
                .map_or_else(|| format!("{what} already exists"), str::to_string),
        );
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
