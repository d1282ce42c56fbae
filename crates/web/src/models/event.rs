//! Event domain types.

use chrono::{DateTime, Utc};

use foodievent_core::ledger::Inventory;
use foodievent_core::{EventCategory, EventId, EventStatus, Price, UserId};

/// A listed event.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    /// Public path of the event image, e.g. `/static/img/tacos.jpg`.
    pub image: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `<venue name>, <city>`
    pub venue: String,
    pub vendor_names: String,
    pub description: String,
    /// Remaining inventory, not the number sold.
    pub total_tickets: i32,
    pub ticket_price: Price,
    pub free_sampling: bool,
    pub provide_takeaway: bool,
    pub category: EventCategory,
    pub status: EventStatus,
    /// When `status` last changed.
    pub status_date: DateTime<Utc>,
    pub creator_id: UserId,
    pub creator_name: String,
}

impl Event {
    /// The ledger's view of this event.
    #[must_use]
    pub const fn inventory(&self) -> Inventory {
        Inventory {
            status: self.status,
            total_tickets: self.total_tickets,
            ticket_price: self.ticket_price,
        }
    }

    /// Whether `user` created this event.
    #[must_use]
    pub fn is_created_by(&self, user: UserId) -> bool {
        self.creator_id == user
    }
}
