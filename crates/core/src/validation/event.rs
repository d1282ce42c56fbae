//! Event create / update form.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use super::{REQUIRED, ValidationErrors, required};
use crate::types::{EventCategory, Price, PriceError};

const TITLE_MAX: usize = 200;
const VENDOR_NAMES_MAX: usize = 255;
const VENDOR_MIN_LETTERS: usize = 4;

/// `datetime-local` inputs, with and without seconds.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

static CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+(?:\s+[A-Za-z]+){0,5}$").expect("Invalid regex"));

static VENDOR_NAMES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s,&'\-]+$").expect("Invalid regex"));

/// Event title. Uniqueness is checked against the store separately.
///
/// # Errors
///
/// Fails for blank or over-long titles.
pub fn title(value: &str) -> Result<String, &'static str> {
    let title = required(value)?;
    if title.chars().count() > TITLE_MAX {
        return Err("Field cannot be longer than 200 characters.");
    }
    Ok(title)
}

/// Venue written as `<name>, <city>`, e.g. `Town Hall, Sydney`.
///
/// # Errors
///
/// Fails unless there are exactly two parts, the name has a letter and the
/// city is one to six words of letters.
pub fn venue(value: &str) -> Result<String, &'static str> {
    let venue = value.trim();
    if venue.is_empty() {
        return Err(REQUIRED);
    }

    let parts: Vec<&str> = venue.split(',').map(str::trim).collect();
    let [name, city] = parts.as_slice() else {
        return Err("Use format like 'Town Hall, Sydney' or 'Convention Centre, South Brisbane'.");
    };
    if name.is_empty() || city.is_empty() {
        return Err("Use format like 'Town Hall, Sydney' or 'Convention Centre, South Brisbane'.");
    }
    if !name.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("The venue name must include letters (e.g., 'Town Hall').");
    }
    if !CITY_RE.is_match(city) {
        return Err("End with a suburb/city (letters & spaces only), e.g., 'South Brisbane'.");
    }

    Ok(venue.to_owned())
}

/// Vendors separated by commas or `&`, e.g. `Alice's Bakery & Bob Jones`.
///
/// # Errors
///
/// Fails on digits or other disallowed characters, or when any vendor has
/// fewer than four letters.
pub fn vendor_names(value: &str) -> Result<String, &'static str> {
    let names = required(value)?;
    if names.chars().count() > VENDOR_NAMES_MAX {
        return Err("Field cannot be longer than 255 characters.");
    }
    if !VENDOR_NAMES_RE.is_match(&names) {
        return Err(
            "Vendor names may use letters, spaces, commas, '&', apostrophes and hyphens only.",
        );
    }

    let too_short = names
        .split([',', '&'])
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .any(|v| v.chars().filter(char::is_ascii_alphabetic).count() < VENDOR_MIN_LETTERS);
    if too_short {
        return Err("Each vendor name must include at least 4 letters (e.g., 'Alice', 'Bob Jones').");
    }

    Ok(names)
}

/// Read a `datetime-local` value entered in `offset`'s local time.
///
/// # Errors
///
/// Fails for blank or unparseable input.
pub fn parse_local_datetime(value: &str, offset: FixedOffset) -> Result<DateTime<Utc>, &'static str> {
    let value = required(value)?;
    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&value, format).ok())
        .ok_or("Not a valid datetime value.")?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or("Not a valid datetime value.")
}

/// Start time must lie in the future.
///
/// # Errors
///
/// Fails when `start <= now`.
pub fn start_time(start: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), &'static str> {
    if start <= now {
        return Err("Start time cannot be in the past.");
    }
    Ok(())
}

/// End time must be in the future, after `start`, and at least an hour later.
///
/// # Errors
///
/// Fails with the first rule broken.
pub fn end_time(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), &'static str> {
    if end <= now {
        return Err("End time cannot be in the past.");
    }
    if end <= start {
        return Err("End time must be after the start time.");
    }
    if end - start < Duration::hours(1) {
        return Err("Event duration must be at least 1 hour.");
    }
    Ok(())
}

/// Check both ends of an event's time window.
///
/// # Errors
///
/// Returns the failures of [`start_time`] and [`end_time`] under their field
/// names.
pub fn event_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check("start_time", start_time(start, now));
    errors.check("end_time", end_time(start, end, now));
    errors.into_result(())
}

fn total_tickets(value: &str) -> Result<i32, &'static str> {
    let value = required(value)?;
    let total: i32 = value.parse().map_err(|_| "Not a valid integer value.")?;
    if total < 1 {
        return Err("An event must offer at least one ticket.");
    }
    Ok(total)
}

fn ticket_price(value: &str) -> Result<Price, &'static str> {
    let value = required(value)?;
    Price::parse(&value).map_err(|e| match e {
        PriceError::Negative => "Number must be at least 0.",
        PriceError::TooPrecise => "Use at most two decimal places.",
        PriceError::NotANumber => "Not a valid decimal value.",
    })
}

fn category(value: &str) -> Result<EventCategory, &'static str> {
    let value = required(value)?;
    value.parse().map_err(|_| "Not a valid choice.")
}

/// Raw event form fields, as submitted.
#[derive(Debug, Clone, Default)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub venue: String,
    pub vendor_names: String,
    pub total_tickets: String,
    pub ticket_price: String,
    pub category: String,
    pub free_sampling: bool,
    pub provide_takeaway: bool,
}

/// An event form that passed every field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub venue: String,
    pub vendor_names: String,
    pub total_tickets: i32,
    pub ticket_price: Price,
    pub category: EventCategory,
    pub free_sampling: bool,
    pub provide_takeaway: bool,
}

impl EventInput {
    /// Validate every field. Times are read in `offset` and checked against `now`.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its first message.
    pub fn validate(
        &self,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<EventDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = errors.check("title", title(&self.title));
        let description = errors.check("description", required(&self.description));
        let start = errors.check("start_time", parse_local_datetime(&self.start_time, offset));
        let end = errors.check("end_time", parse_local_datetime(&self.end_time, offset));
        if let (Some(start), Some(end)) = (start, end)
            && let Err(window) = event_window(start, end, now)
        {
            errors.merge(window);
        }
        let venue = errors.check("venue", venue(&self.venue));
        let vendor_names = errors.check("vendor_names", vendor_names(&self.vendor_names));
        let total_tickets = errors.check("total_tickets", total_tickets(&self.total_tickets));
        let ticket_price = errors.check("ticket_price", ticket_price(&self.ticket_price));
        let category = errors.check("category", category(&self.category));

        if !errors.is_empty() {
            return Err(errors);
        }

        match (
            title,
            description,
            start,
            end,
            venue,
            vendor_names,
            total_tickets,
            ticket_price,
            category,
        ) {
            (
                Some(title),
                Some(description),
                Some(start_time),
                Some(end_time),
                Some(venue),
                Some(vendor_names),
                Some(total_tickets),
                Some(ticket_price),
                Some(category),
            ) => Ok(EventDraft {
                title,
                description,
                start_time,
                end_time,
                venue,
                vendor_names,
                total_tickets,
                ticket_price,
                category,
                free_sampling: self.free_sampling,
                provide_takeaway: self.provide_takeaway,
            }),
            _ => Err(errors),
        }
    }
}
