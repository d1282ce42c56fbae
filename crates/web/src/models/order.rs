//! Order domain types.

use chrono::{DateTime, Utc};

use foodievent_core::ledger::OrderLine;
use foodievent_core::{EventId, OrderId, Price, TicketStatus, UserId};

/// A ticket purchase.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub tickets_purchased: i32,
    /// Ticket price at the moment of purchase.
    pub purchase_ticket_price: Price,
    pub purchased_amount: Price,
    pub ticket_status: TicketStatus,
    pub booking_time: DateTime<Utc>,
}

impl Order {
    /// The ledger's view of this order.
    #[must_use]
    pub const fn line(&self) -> OrderLine {
        OrderLine {
            id: self.id,
            tickets_purchased: self.tickets_purchased,
            purchased_amount: self.purchased_amount,
            status: self.ticket_status,
        }
    }
}

/// An order joined with the event it is for, as listed in booking history.
#[derive(Debug, Clone)]
pub struct Booking {
    pub order: Order,
    pub event_title: String,
    pub event_image: String,
    pub event_start_time: DateTime<Utc>,
    pub event_venue: String,
}
