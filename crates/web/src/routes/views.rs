//! View models for templates.
//!
//! Templates never format dates or money themselves: everything arrives here
//! as display-ready strings, with times shown in the configured offset.

use chrono::{DateTime, FixedOffset, Utc};

use foodievent_core::EventCategory;
use foodievent_core::validation::EventInput;

use crate::models::{Booking, Comment, Event};

/// Display format for event and booking times, e.g. `Sat 14 Jun 2025, 6:30 PM`.
const DISPLAY_FORMAT: &str = "%a %-d %b %Y, %-I:%M %p";

/// Value format of a `datetime-local` input.
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Format a timestamp for display.
#[must_use]
pub fn display_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(DISPLAY_FORMAT).to_string()
}

/// Format a timestamp as a `datetime-local` input value.
#[must_use]
pub fn input_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(INPUT_FORMAT).to_string()
}

/// `1 ticket`, `5 tickets`.
#[must_use]
pub fn tickets(count: i32) -> String {
    if count == 1 {
        "1 ticket".to_string()
    } else {
        format!("{count} tickets")
    }
}

/// A category in the navigation bar.
#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub slug: &'static str,
    pub label: &'static str,
    pub active: bool,
}

impl CategoryLink {
    /// All categories, marking `active` as the current one.
    #[must_use]
    pub fn all(active: Option<EventCategory>) -> Vec<Self> {
        EventCategory::ALL
            .iter()
            .map(|&c| Self {
                slug: c.slug(),
                label: c.label(),
                active: active == Some(c),
            })
            .collect()
    }
}

/// An event in a listing.
#[derive(Debug, Clone)]
pub struct EventCard {
    pub id: i32,
    pub title: String,
    pub image: String,
    pub category: &'static str,
    pub status: String,
    pub status_badge: &'static str,
    pub starts: String,
    pub venue: String,
    pub price: String,
    pub remaining: String,
    pub description: String,
}

impl EventCard {
    #[must_use]
    pub fn new(event: &Event, offset: FixedOffset) -> Self {
        Self {
            id: event.id.as_i32(),
            title: event.title.clone(),
            image: event.image.clone(),
            category: event.category.label(),
            status: event.status.to_string(),
            status_badge: event.status.badge(),
            starts: display_time(event.start_time, offset),
            venue: event.venue.clone(),
            price: event.ticket_price.to_string(),
            remaining: tickets(event.total_tickets),
            description: excerpt(&event.description, 140),
        }
    }
}

/// A full event page.
#[derive(Debug, Clone)]
pub struct EventView {
    pub card: EventCard,
    pub ends: String,
    pub vendor_names: String,
    pub description: String,
    pub free_sampling: bool,
    pub provide_takeaway: bool,
    pub creator_name: String,
    pub status_since: String,
    pub on_sale: bool,
    pub total_tickets: i32,
    pub is_creator: bool,
}

impl EventView {
    #[must_use]
    pub fn new(event: &Event, offset: FixedOffset, is_creator: bool) -> Self {
        Self {
            card: EventCard::new(event, offset),
            ends: display_time(event.end_time, offset),
            vendor_names: event.vendor_names.clone(),
            description: event.description.clone(),
            free_sampling: event.free_sampling,
            provide_takeaway: event.provide_takeaway,
            creator_name: event.creator_name.clone(),
            status_since: display_time(event.status_date, offset),
            on_sale: event.status.is_on_sale() && event.total_tickets > 0,
            total_tickets: event.total_tickets,
            is_creator,
        }
    }
}

/// A comment under an event.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: i32,
    pub author: String,
    pub contents: String,
    pub posted: String,
}

impl CommentView {
    #[must_use]
    pub fn new(comment: &Comment, offset: FixedOffset) -> Self {
        Self {
            id: comment.id.as_i32(),
            author: comment.author.clone(),
            contents: comment.contents.clone(),
            posted: display_time(comment.comment_date, offset),
        }
    }
}

/// A row of the booking history.
#[derive(Debug, Clone)]
pub struct BookingView {
    pub order_id: i32,
    pub event_id: i32,
    pub event_title: String,
    pub event_image: String,
    pub event_starts: String,
    pub event_venue: String,
    pub tickets: String,
    pub unit_price: String,
    pub amount: String,
    pub status: String,
    pub status_badge: &'static str,
    pub booked: String,
    pub cancellable: bool,
}

impl BookingView {
    #[must_use]
    pub fn new(booking: &Booking, offset: FixedOffset) -> Self {
        let order = &booking.order;
        Self {
            order_id: order.id.as_i32(),
            event_id: order.event_id.as_i32(),
            event_title: booking.event_title.clone(),
            event_image: booking.event_image.clone(),
            event_starts: display_time(booking.event_start_time, offset),
            event_venue: booking.event_venue.clone(),
            tickets: tickets(order.tickets_purchased),
            unit_price: order.purchase_ticket_price.to_string(),
            amount: order.purchased_amount.to_string(),
            status: order.ticket_status.to_string(),
            status_badge: order.ticket_status.badge(),
            booked: display_time(order.booking_time, offset),
            cancellable: order.ticket_status == foodievent_core::TicketStatus::Active,
        }
    }
}

/// Pre-fill the event form from a stored event.
#[must_use]
pub fn event_input(event: &Event, offset: FixedOffset) -> EventInput {
    EventInput {
        title: event.title.clone(),
        description: event.description.clone(),
        start_time: input_time(event.start_time, offset),
        end_time: input_time(event.end_time, offset),
        venue: event.venue.clone(),
        vendor_names: event.vendor_names.clone(),
        total_tickets: event.total_tickets.to_string(),
        ticket_price: event.ticket_price.amount().to_string(),
        category: event.category.to_string(),
        free_sampling: event.free_sampling,
        provide_takeaway: event.provide_takeaway,
    }
}

/// First `max` characters of `text`, on a word boundary, with an ellipsis.
fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let cut = cut.rsplit_once(' ').map_or(cut.as_str(), |(head, _)| head);
    format!("{}\u{2026}", cut.trim_end())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn brisbane() -> FixedOffset {
        FixedOffset::east_opt(10 * 3600).unwrap()
    }

    #[test]
    fn test_times_use_offset() {
        let at = Utc.with_ymd_and_hms(2025, 6, 14, 8, 30, 0).unwrap();
        assert_eq!(display_time(at, brisbane()), "Sat 14 Jun 2025, 6:30 PM");
        assert_eq!(input_time(at, brisbane()), "2025-06-14T18:30");
    }

    #[test]
    fn test_tickets() {
        assert_eq!(tickets(1), "1 ticket");
        assert_eq!(tickets(0), "0 tickets");
        assert_eq!(tickets(12), "12 tickets");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("tacos and churros all night", 12), "tacos and\u{2026}");
    }

    #[test]
    fn test_category_links() {
        let links = CategoryLink::all(Some(EventCategory::Drink));
        assert_eq!(links.len(), 4);
        assert!(links.iter().any(|l| l.slug == "drink" && l.active));
        assert_eq!(links.iter().filter(|l| l.active).count(), 1);
    }
}
