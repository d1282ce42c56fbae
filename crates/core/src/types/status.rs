//! Status and category enums for events and tickets.
//!
//! Values are stored as PostgreSQL enum types in the `foodievent` schema and
//! rendered upper-case (`OPEN`, `SOLDOUT`) everywhere a user sees them.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an event.
///
/// `Cancelled` is sticky until the event ends; `Soldout` outranks `Open`.
/// See [`crate::lifecycle::derive_event_status`] for the full rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "foodievent.event_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// On sale and not yet ended.
    #[default]
    Open,
    /// Ended, or cancelled and then ended.
    Inactive,
    /// No tickets remain.
    Soldout,
    /// Withdrawn by its creator.
    Cancelled,
}

impl EventStatus {
    /// Whether tickets may be bought in this state.
    #[must_use]
    pub const fn is_on_sale(self) -> bool {
        matches!(self, Self::Open | Self::Soldout)
    }

    /// CSS modifier used by the templates for the status badge.
    #[must_use]
    pub const fn badge(self) -> &'static str {
        match self {
            Self::Open => "success",
            Self::Inactive => "secondary",
            Self::Soldout => "warning",
            Self::Cancelled => "danger",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Soldout => write!(f, "SOLDOUT"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "INACTIVE" => Ok(Self::Inactive),
            "SOLDOUT" => Ok(Self::Soldout),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid event status: {s}")),
        }
    }
}

/// State of the tickets held by one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "foodievent.ticket_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Valid for an upcoming or running event.
    #[default]
    Active,
    /// The event has ended.
    Inactive,
    /// Cancelled by the holder or with the event.
    Cancelled,
}

impl TicketStatus {
    /// CSS modifier used by the templates for the status badge.
    #[must_use]
    pub const fn badge(self) -> &'static str {
        match self {
            Self::Active => "success",
            Self::Inactive => "secondary",
            Self::Cancelled => "danger",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid ticket status: {s}")),
        }
    }
}

/// Event category, used for filtering and the navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "foodievent.event_category", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Food,
    Drink,
    Cultural,
    Dietary,
}

impl EventCategory {
    /// Every category, in menu order.
    pub const ALL: [Self; 4] = [Self::Food, Self::Drink, Self::Cultural, Self::Dietary];

    /// URL segment for `/category/{slug}`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Drink => "drink",
            Self::Cultural => "cultural",
            Self::Dietary => "dietary",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Drink => "Drink",
            Self::Cultural => "Cultural",
            Self::Dietary => "Dietary",
        }
    }

    /// Look up a category by its URL segment.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Food => write!(f, "FOOD"),
            Self::Drink => write!(f, "DRINK"),
            Self::Cultural => write!(f, "CULTURAL"),
            Self::Dietary => write!(f, "DIETARY"),
        }
    }
}

impl std::str::FromStr for EventCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FOOD" => Ok(Self::Food),
            "DRINK" => Ok(Self::Drink),
            "CULTURAL" => Ok(Self::Cultural),
            "DIETARY" => Ok(Self::Dietary),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_status_display_and_parse() {
        for status in [
            EventStatus::Open,
            EventStatus::Inactive,
            EventStatus::Soldout,
            EventStatus::Cancelled,
        ] {
            let parsed: EventStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("closed".parse::<EventStatus>().is_err());
    }

    #[test]
    fn test_on_sale_states() {
        assert!(EventStatus::Open.is_on_sale());
        assert!(EventStatus::Soldout.is_on_sale());
        assert!(!EventStatus::Inactive.is_on_sale());
        assert!(!EventStatus::Cancelled.is_on_sale());
    }

    #[test]
    fn test_ticket_status_parse_is_case_insensitive() {
        assert_eq!("active".parse::<TicketStatus>().unwrap(), TicketStatus::Active);
        assert_eq!(
            "Cancelled".parse::<TicketStatus>().unwrap(),
            TicketStatus::Cancelled
        );
    }

    #[test]
    fn test_category_slugs() {
        assert_eq!(EventCategory::from_slug("drink"), Some(EventCategory::Drink));
        assert_eq!(EventCategory::from_slug("DRINK"), None);
        assert_eq!(EventCategory::from_slug("dessert"), None);
        for category in EventCategory::ALL {
            assert_eq!(EventCategory::from_slug(category.slug()), Some(category));
        }
    }

    #[test]
    fn test_serde_uses_upper_case() {
        let json = serde_json::to_string(&EventStatus::Soldout).unwrap();
        assert_eq!(json, "\"SOLDOUT\"");
        let category: EventCategory = serde_json::from_str("\"CULTURAL\"").unwrap();
        assert_eq!(category, EventCategory::Cultural);
    }
}
