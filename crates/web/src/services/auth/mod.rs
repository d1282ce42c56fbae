//! Authentication service.
//!
//! Registration and password login. Field rules live in
//! [`foodievent_core::validation`]; this service adds the checks that need
//! the database and does the hashing.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use foodievent_core::validation::NewAccount;
use foodievent_core::{Email, ValidationErrors};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, PHONE_UNIQUE, UserRepository};
use crate::models::User;

/// Shown when the email is already registered.
pub const EMAIL_TAKEN: &str = "An account already exists with this email.";

/// Shown when the mobile number is already registered.
pub const PHONE_TAKEN: &str = "This mobile number is already registered.";

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a validated account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the email or phone is already
    /// registered, with one message per taken field.
    /// Returns `AuthError::PasswordHash` if hashing fails.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(&self, account: NewAccount) -> Result<User, AuthError> {
        let mut errors = ValidationErrors::new();
        if self.users.email_exists(&account.email).await? {
            errors.add("email", EMAIL_TAKEN);
        }
        if self.users.phone_exists(&account.phone).await? {
            errors.add("phone", PHONE_TAKEN);
        }
        errors.into_result(())?;

        let password_hash = hash_password(&account.password)?;

        let user = self
            .users
            .create(&NewUser {
                first_name: &account.first_name,
                surname: &account.surname,
                email: &account.email,
                phone: &account.phone,
                address: &account.address,
                password_hash: &password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration
                RepositoryError::Conflict(constraint) => AuthError::Validation(taken(&constraint)),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the
    /// password is wrong. The two cases are indistinguishable to the caller.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// The form error for a unique violation on `constraint`.
fn taken(constraint: &str) -> ValidationErrors {
    if constraint == PHONE_UNIQUE {
        ValidationErrors::single("phone", PHONE_TAKEN)
    } else {
        ValidationErrors::single("email", EMAIL_TAKEN)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
