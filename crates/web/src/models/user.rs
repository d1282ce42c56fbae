//! User domain types.

use chrono::{DateTime, Utc};

use foodievent_core::{Email, UserId};

/// A registered FoodieVent user.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    pub first_name: String,
    pub surname: String,
    /// Unique, normalized email address.
    pub email: Email,
    /// Unique ten-digit mobile number.
    pub phone: String,
    pub address: String,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// First name and surname, as shown in greetings and comments.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}
