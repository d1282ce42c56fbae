//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use foodievent_core::{Email, UserId};

use super::{RepositoryError, conflict_or_database};
use crate::models::User;

// =============================================================================
// Row Types
// =============================================================================

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    first_name: String,
    surname: String,
    email: String,
    phone: String,
    address: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            surname: row.surname,
            email,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
        })
    }
}

/// Row type for login lookups, carrying the password hash.
#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Unique constraint on `users.email`.
pub const EMAIL_UNIQUE: &str = "users_email_key";

/// Unique constraint on `users.phone`.
pub const PHONE_UNIQUE: &str = "users_phone_key";

/// Fields of a new account, already validated and hashed.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub surname: &'a str,
    pub email: &'a Email,
    pub phone: &'a str,
    pub address: &'a str,
    pub password_hash: &'a str,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, first_name, surname, email, phone, address, created_at
            FROM foodievent.users
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, first_name, surname, email, phone, address, created_at, password_hash
            FROM foodievent.users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Whether an account already uses `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM foodievent.users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Whether an account already uses `phone`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn phone_exists(&self, phone: &str) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM foodievent.users WHERE phone = $1)")
                .bind(phone)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewUser<'_>) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO foodievent.users
                (first_name, surname, email, phone, address, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, first_name, surname, email, phone, address, created_at
            ",
        )
        .bind(new.first_name)
        .bind(new.surname)
        .bind(new.email.as_str())
        .bind(new.phone)
        .bind(new.address)
        .bind(new.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "account"))?;

        row.try_into()
    }
}
