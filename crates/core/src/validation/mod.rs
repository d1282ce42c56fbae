//! Form validation.
//!
//! Every form is validated in full before anything is written: each validator
//! reports at most one message per field, and [`ValidationErrors`] collects
//! them so the page can show all problems at once.
//!
//! Checks that need the database (duplicate email, phone or title) are added
//! on top of these by the web services.

mod account;
mod event;
mod upload;

pub use account::{
    LoginInput, NewAccount, RegistrationInput, au_mobile, email_domain, human_name,
    password_strength, street_address,
};
pub use event::{
    EventDraft, EventInput, end_time, event_window, parse_local_datetime, start_time, title,
    vendor_names, venue,
};
pub use upload::{ALLOWED_IMAGE_EXTENSIONS, image_filename, secure_filename};

use serde::Serialize;

/// Message used by every "must not be empty" check.
pub const REQUIRED: &str = "This field is required.";

/// A message attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All validation failures for one submitted form.
#[derive(thiserror::Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Build a set holding a single message.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message for `field` unless it already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if !self.has(field) {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
    }

    /// Record the error of `result`, if any, and pass the value through.
    pub fn check<T>(&mut self, field: &'static str, result: Result<T, &'static str>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    /// Fold another set in, keeping existing messages first.
    pub fn merge(&mut self, other: Self) {
        for error in other.errors {
            self.add(error.field, error.message);
        }
    }

    /// The message for `field`, if it failed.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(value)` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Trim, and fail with [`REQUIRED`] if nothing is left.
///
/// # Errors
///
/// Returns [`REQUIRED`] for blank input.
pub fn required(value: &str) -> Result<String, &'static str> {
    let value = value.trim();
    if value.is_empty() {
        Err(REQUIRED)
    } else {
        Ok(value.to_owned())
    }
}

/// Trim and collapse runs of whitespace into one space.
#[must_use]
pub fn collapse_spaces(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep only ASCII digits.
#[must_use]
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Comment text.
///
/// # Errors
///
/// Fails when the comment is blank.
pub fn comment_contents(value: &str) -> Result<String, &'static str> {
    required(value)
}

/// Number of tickets requested in a purchase.
///
/// # Errors
///
/// Fails for blank input, non-integers and anything below one.
pub fn purchase_quantity(value: &str) -> Result<i32, &'static str> {
    let value = required(value)?;
    let quantity: i32 = value.parse().map_err(|_| "Not a valid integer value.")?;
    if quantity < 1 {
        return Err("Please order at least one ticket.");
    }
    Ok(quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");
        errors.add("phone", "other");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first("email"), Some("first"));
        assert_eq!(errors.first("phone"), Some("other"));
        assert_eq!(errors.first("address"), None);
    }

    #[test]
    fn test_check_passes_values_through() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.check("a", Ok::<_, &'static str>(3)), Some(3));
        assert_eq!(errors.check::<i32>("b", Err("bad")), None);
        assert!(errors.has("b"));
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn test_merge_keeps_existing_message() {
        let mut errors = ValidationErrors::single("title", "too long");
        errors.merge(ValidationErrors::single("title", "duplicate"));
        errors.merge(ValidationErrors::single("venue", "bad venue"));
        assert_eq!(errors.first("title"), Some("too long"));
        assert_eq!(errors.first("venue"), Some("bad venue"));
    }

    #[test]
    fn test_empty_set_is_ok() {
        assert_eq!(ValidationErrors::new().into_result(5).unwrap(), 5);
    }

    #[test]
    fn test_normalizers() {
        assert_eq!(collapse_spaces("  Boon    Leon "), "Boon Leon");
        assert_eq!(digits_only("0412 345-678"), "0412345678");
        assert_eq!(required("  x "), Ok("x".to_owned()));
        assert_eq!(required(" \t"), Err(REQUIRED));
    }

    #[test]
    fn test_purchase_quantity() {
        assert_eq!(purchase_quantity(" 3 "), Ok(3));
        assert_eq!(purchase_quantity(""), Err(REQUIRED));
        assert!(purchase_quantity("0").is_err());
        assert!(purchase_quantity("-2").is_err());
        assert!(purchase_quantity("two").is_err());
    }

    #[test]
    fn test_comment_contents() {
        assert_eq!(comment_contents(" Great tacos "), Ok("Great tacos".to_owned()));
        assert!(comment_contents("   ").is_err());
    }
}
