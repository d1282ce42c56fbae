//! Registration and login forms.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{REQUIRED, ValidationErrors, collapse_spaces, digits_only};
use crate::types::{Email, EmailError};

const NAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 8;
const ADDRESS_MIN: usize = 8;
const ADDRESS_MAX: usize = 120;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z](?:[A-Za-z\s'\-]*[A-Za-z])?$").expect("Invalid regex")
});

static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^04\d{8}$").expect("Invalid regex"));

/// `[unit/]number street-name suffix`, e.g. `5/23 O'Connell Rd`.
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:\d{1,4}(?:-\d{1,4})?/)?\d{1,5}\s+",
        r"[A-Za-z][A-Za-z\s'.\-]{2,}",
        r"(?:\s+(?:St|Street|Rd|Road|Ave|Avenue|Blvd|Dr|Drive|Ct|Court|Pl|Place|Cres|Crescent|Hwy|Highway))$",
    ))
    .expect("Invalid regex")
});

/// A first name or surname.
///
/// Letters with inner spaces, hyphens or apostrophes, starting and ending
/// with a letter. Runs of spaces are collapsed first.
///
/// # Errors
///
/// Fails for blank, over-long or malformed names.
pub fn human_name(value: &str) -> Result<String, &'static str> {
    let name = collapse_spaces(value);
    if name.is_empty() {
        return Err(REQUIRED);
    }
    if name.chars().count() > NAME_MAX {
        return Err("Field cannot be longer than 50 characters.");
    }
    if !NAME_RE.is_match(&name) {
        return Err(
            "Letters, spaces, hyphens and apostrophes only (e.g., Boon Leon, O'Connor, Anne-Marie).",
        );
    }
    Ok(name)
}

/// Password strength.
///
/// At least eight characters drawn from three of the four classes
/// (lowercase, uppercase, digit, symbol), and free of the holder's names and
/// email local part. Only personal tokens of three or more characters are
/// checked, case-insensitively.
///
/// # Errors
///
/// Fails with the first rule the password breaks.
pub fn password_strength(
    password: &str,
    first_name: &str,
    surname: &str,
    email: &str,
) -> Result<(), &'static str> {
    if password.is_empty() {
        return Err(REQUIRED);
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err("Password must be at least 8 characters long.");
    }

    let classes = [
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(char::is_numeric),
        password
            .chars()
            .any(|c| !c.is_alphanumeric() && c != '_' && !c.is_whitespace()),
    ];
    if classes.iter().filter(|&&present| present).count() < 3 {
        return Err("Use at least three of: lowercase, uppercase, digit, symbol.");
    }

    let local_part = email.split('@').next().unwrap_or_default();
    let lowered = password.to_lowercase();
    let leaks_identity = [first_name, surname, local_part]
        .iter()
        .map(|token| token.trim().to_lowercase())
        .any(|token| token.chars().count() >= 3 && lowered.contains(&token));
    if leaks_identity {
        return Err("Password must not contain your name or email.");
    }

    Ok(())
}

/// Australian mobile number, returned as its ten digits.
///
/// # Errors
///
/// Fails unless the digits are exactly `04` followed by eight more.
pub fn au_mobile(value: &str) -> Result<String, &'static str> {
    let digits = digits_only(value);
    if digits.is_empty() {
        return Err("Please enter your mobile number");
    }
    if digits.len() != 10 {
        return Err("Enter a valid 10-digit mobile number.");
    }
    if !MOBILE_RE.is_match(&digits) {
        return Err("Mobile numbers must start with 04 and be 10 digits (e.g., 04XXXXXXXX).");
    }
    Ok(digits)
}

/// Email address with a recognised domain ending.
///
/// # Errors
///
/// Fails for malformed addresses and for domain endings outside
/// [`crate::types::COMMON_DOMAIN_SUFFIXES`].
pub fn email_domain(value: &str) -> Result<Email, &'static str> {
    let email = Email::parse(value).map_err(|e| match e {
        EmailError::Empty => REQUIRED,
        EmailError::TooLong { .. } => "Field cannot be longer than 120 characters.",
        _ => "Please enter a valid email",
    })?;
    if !email.has_common_suffix() {
        return Err("Please enter an email with a common domain ending (e.g., .com, .org, .com.au).");
    }
    Ok(email)
}

/// Street address such as `12 King St` or `44-46 Main Road`.
///
/// # Errors
///
/// Fails for blank input or anything not shaped like number, street and suffix.
pub fn street_address(value: &str) -> Result<String, &'static str> {
    let address = value.trim();
    if address.is_empty() {
        return Err(REQUIRED);
    }
    let len = address.chars().count();
    if !(ADDRESS_MIN..=ADDRESS_MAX).contains(&len) || !ADDRESS_RE.is_match(address) {
        return Err(
            "Use this format: number + street + suffix (e.g. 12 King St OR 5/23 O'Connell Rd OR 44-46 Main Road)",
        );
    }
    Ok(address.to_owned())
}

/// Raw registration form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

/// A registration that passed every field check.
///
/// Uniqueness of `email` and `phone` is still to be confirmed against the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub surname: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub password: String,
}

impl RegistrationInput {
    /// Normalize and validate every field.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its first message.
    pub fn validate(&self) -> Result<NewAccount, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let first_name = errors.check("first_name", human_name(&self.first_name));
        let surname = errors.check("surname", human_name(&self.surname));
        let email = errors.check("email", email_domain(&self.email));
        let phone = errors.check("phone", au_mobile(&self.phone));
        let address = errors.check("address", street_address(&self.address));

        // Identity tokens are compared as submitted so a rejected name still
        // blocks its use inside the password.
        let strength = password_strength(
            &self.password,
            &collapse_spaces(&self.first_name),
            &collapse_spaces(&self.surname),
            &self.email.trim().to_lowercase(),
        );
        errors.check("password", strength);
        if self.password != self.confirm {
            errors.add("password", "Passwords should match");
        }

        match (first_name, surname, email, phone, address) {
            (Some(first_name), Some(surname), Some(email), Some(phone), Some(address))
                if errors.is_empty() =>
            {
                Ok(NewAccount {
                    first_name,
                    surname,
                    email,
                    phone,
                    address,
                    password: self.password.clone(),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Raw login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginInput {
    /// Check both fields are present and return the normalized email.
    ///
    /// # Errors
    ///
    /// Fails when either field is blank or the email is malformed.
    pub fn validate(&self) -> Result<Email, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = errors.check(
            "email",
            Email::parse(&self.email).map_err(|e| match e {
                EmailError::Empty => REQUIRED,
                _ => "Please enter a valid email",
            }),
        );
        if self.password.is_empty() {
            errors.add("password", "Enter user password");
        }
        match email {
            Some(email) if errors.is_empty() => Ok(email),
            _ => Err(errors),
        }
    }
}
