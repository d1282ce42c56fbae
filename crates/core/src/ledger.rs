//! Ticket inventory ledger.
//!
//! `events.total_tickets` holds the *remaining* inventory. Purchases take from
//! it; cancelling an order or a whole event puts tickets back. The functions
//! here decide what a transition does without touching storage. The web
//! services apply the resulting plan inside a single transaction.

use crate::types::{EventStatus, OrderId, Price, TicketStatus};

/// Reasons a ledger transition is refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Please order at least one ticket.")]
    InvalidQuantity,

    #[error("Tickets for this event are not on sale while it is {0}.")]
    NotOnSale(EventStatus),

    #[error(
        "Order was unable to be booked, please enter a value less than the remaining amount of tickets. Tickets remaining: {remaining}."
    )]
    InsufficientInventory { requested: i32, remaining: i32 },

    #[error("Only a cancelled event can be re-opened; this event is {0}.")]
    NotCancelled(EventStatus),
}

/// What a purchase needs to know about its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inventory {
    pub status: EventStatus,
    pub total_tickets: i32,
    pub ticket_price: Price,
}

/// Outcome of a successful [`plan_purchase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchasePlan {
    pub quantity: i32,
    /// Price per ticket, frozen onto the order.
    pub unit_price: Price,
    pub amount: Price,
    /// Inventory left after the purchase.
    pub remaining: i32,
    /// The purchase takes the last tickets; the event becomes sold out now
    /// rather than on the next status pass.
    pub sold_out: bool,
}

/// Plan the purchase of `quantity` tickets.
///
/// # Errors
///
/// - [`LedgerError::InvalidQuantity`] when `quantity < 1`
/// - [`LedgerError::NotOnSale`] when the event is cancelled or inactive
/// - [`LedgerError::InsufficientInventory`] when `quantity` exceeds the remaining tickets
pub fn plan_purchase(inventory: &Inventory, quantity: i32) -> Result<PurchasePlan, LedgerError> {
    if quantity < 1 {
        return Err(LedgerError::InvalidQuantity);
    }

    if !inventory.status.is_on_sale() {
        return Err(LedgerError::NotOnSale(inventory.status));
    }

    let remaining = inventory.total_tickets.max(0);
    if quantity > remaining {
        return Err(LedgerError::InsufficientInventory {
            requested: quantity,
            remaining,
        });
    }

    let remaining = remaining - quantity;
    Ok(PurchasePlan {
        quantity,
        unit_price: inventory.ticket_price,
        amount: inventory.ticket_price.times(quantity),
        remaining,
        sold_out: remaining == 0,
    })
}

/// The ledger's view of an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub id: OrderId,
    pub tickets_purchased: i32,
    pub purchased_amount: Price,
    pub status: TicketStatus,
}

/// Tickets to hand back to an event's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restock {
    pub order_id: OrderId,
    pub tickets: i32,
}

/// Cancel a single order.
///
/// Returns `None` when the order is already cancelled, so repeated cancels
/// restock exactly once.
#[must_use]
pub fn cancel_order(order: &OrderLine) -> Option<Restock> {
    (order.status != TicketStatus::Cancelled).then_some(Restock {
        order_id: order.id,
        tickets: order.tickets_purchased,
    })
}

/// Result of cancelling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationSummary {
    pub tickets_to_return: i32,
    /// Reported to the creator only; no payment is reversed.
    pub total_refund: Price,
    /// Orders that were active and must now be cancelled.
    pub order_ids: Vec<OrderId>,
}

impl CancellationSummary {
    /// Flash text shown to the event's creator.
    #[must_use]
    pub fn message(&self, title: &str) -> String {
        format!(
            "{title} has been cancelled. {} tickets have been refunded and resupplied. Total amount refunded: {}",
            self.tickets_to_return, self.total_refund
        )
    }
}

/// Plan the cancellation of an event holding `orders`.
///
/// Returns `None` when the event is already cancelled. Only active orders are
/// refunded; inactive and cancelled ones are left as they are.
#[must_use]
pub fn plan_event_cancellation(
    status: EventStatus,
    orders: &[OrderLine],
) -> Option<CancellationSummary> {
    if status == EventStatus::Cancelled {
        return None;
    }

    let active: Vec<&OrderLine> = orders
        .iter()
        .filter(|o| o.status == TicketStatus::Active)
        .collect();

    Some(CancellationSummary {
        tickets_to_return: active.iter().map(|o| o.tickets_purchased).sum(),
        total_refund: active.iter().map(|o| o.purchased_amount).sum(),
        order_ids: active.iter().map(|o| o.id).collect(),
    })
}

/// Re-open a cancelled event.
///
/// The returned status is `Open`; the next status pass may immediately move it
/// to sold out or inactive.
///
/// # Errors
///
/// Returns [`LedgerError::NotCancelled`] for any status other than cancelled.
pub fn reopen(status: EventStatus) -> Result<EventStatus, LedgerError> {
    match status {
        EventStatus::Cancelled => Ok(EventStatus::Open),
        other => Err(LedgerError::NotCancelled(other)),
    }
}
