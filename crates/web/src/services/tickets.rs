//! Ticket purchases and order cancellations.
//!
//! Each operation runs the ledger plan inside one transaction with the event
//! row locked, so two buyers can never take the same last tickets.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use foodievent_core::ledger::{self, Inventory, LedgerError};
use foodievent_core::lifecycle::derive_event_status;
use foodievent_core::{EventId, OrderId, UserId};

use crate::db::{EventRepository, OrderRepository, RepositoryError};
use crate::models::Order;

/// Errors from ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// The ledger refused the transition; nothing was written.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Event or order does not exist.
    #[error("not found")]
    NotFound,

    /// The order belongs to someone else.
    #[error("You can only cancel your own orders.")]
    Forbidden,

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for TicketError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

impl From<sqlx::Error> for TicketError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// A completed purchase.
#[derive(Debug, Clone)]
pub struct Purchase {
    pub order: Order,
    pub event_title: String,
    /// Tickets left after this purchase.
    pub remaining: i32,
}

impl Purchase {
    /// Flash text shown to the buyer.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Thank you for your purchase! Your order number is #{}. {} tickets have been purchased for {}.",
            self.order.id, self.order.tickets_purchased, self.order.purchased_amount
        )
    }
}

/// Result of cancelling one order.
#[derive(Debug, Clone)]
pub struct OrderCancellation {
    pub order_id: OrderId,
    pub event_id: EventId,
    pub event_title: String,
    /// Tickets put back, or `None` when the order was already cancelled.
    pub restocked: Option<i32>,
}

impl OrderCancellation {
    /// Flash text shown to the order's owner.
    #[must_use]
    pub fn message(&self) -> String {
        match self.restocked {
            Some(_) => format!(
                "The order #{} for the event {} has been cancelled.",
                self.order_id, self.event_title
            ),
            None => format!("The order #{} was already cancelled.", self.order_id),
        }
    }
}

/// Ticket service.
pub struct TicketService<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketService<'a> {
    /// Create a new ticket service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Buy `quantity` tickets for `event`.
    ///
    /// The event's status is re-derived at `now` before planning, so a
    /// purchase never slips through on a stale `OPEN` after the event ended.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::Ledger` when the quantity is invalid, the event
    /// is not on sale or too few tickets remain.
    /// Returns `TicketError::NotFound` if the event does not exist.
    #[instrument(skip(self), fields(buyer = %buyer, event = %event))]
    pub async fn purchase(
        &self,
        buyer: UserId,
        event: EventId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Purchase, TicketError> {
        let mut tx = self.pool.begin().await?;

        let locked = EventRepository::lock(&mut tx, event).await?;
        let inventory = Inventory {
            status: derive_event_status(locked.status, locked.end_time, locked.total_tickets, now),
            total_tickets: locked.total_tickets,
            ticket_price: locked.ticket_price,
        };

        let plan = ledger::plan_purchase(&inventory, quantity).inspect_err(|e| {
            tracing::warn!(error = %e, "Purchase refused");
        })?;

        let remaining = EventRepository::take_tickets(&mut tx, event, plan.quantity, now)
            .await?
            .ok_or(LedgerError::InsufficientInventory {
                requested: plan.quantity,
                remaining: locked.total_tickets,
            })?;

        let order = OrderRepository::create(&mut tx, buyer, event, &plan, now).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            tickets = plan.quantity,
            remaining,
            sold_out = plan.sold_out,
            "Tickets purchased"
        );

        Ok(Purchase {
            order,
            event_title: locked.title,
            remaining,
        })
    }

    /// Cancel one of `owner`'s orders and return its tickets to the event.
    ///
    /// Cancelling an already-cancelled order succeeds without restocking.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::NotFound` if the order does not exist and
    /// `TicketError::Forbidden` if it belongs to another user.
    #[instrument(skip(self), fields(owner = %owner, order = %order_id))]
    pub async fn cancel_order(
        &self,
        owner: UserId,
        order_id: OrderId,
    ) -> Result<OrderCancellation, TicketError> {
        let mut tx = self.pool.begin().await?;

        let event_id = OrderRepository::event_of(&mut tx, order_id).await?;
        let event = EventRepository::lock(&mut tx, event_id).await?;
        let order = OrderRepository::lock(&mut tx, order_id).await?;

        if order.user_id != owner {
            tracing::warn!("Attempt to cancel another user's order");
            return Err(TicketError::Forbidden);
        }

        let restock = ledger::cancel_order(&order.line());
        if let Some(restock) = restock {
            EventRepository::restock(&mut tx, event_id, restock.tickets).await?;
            OrderRepository::cancel(&mut tx, &[restock.order_id]).await?;
        }

        tx.commit().await?;

        if let Some(restock) = restock {
            tracing::info!(tickets = restock.tickets, "Order cancelled and restocked");
        }

        Ok(OrderCancellation {
            order_id,
            event_id,
            event_title: event.title,
            restocked: restock.map(|r| r.tickets),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodievent_core::{Price, TicketStatus};

    fn order(tickets: i32) -> Order {
        Order {
            id: OrderId::new(42),
            user_id: UserId::new(1),
            event_id: EventId::new(7),
            tickets_purchased: tickets,
            purchase_ticket_price: Price::parse("12.50").unwrap(),
            purchased_amount: Price::parse("12.50").unwrap().times(tickets),
            ticket_status: TicketStatus::Active,
            booking_time: Utc::now(),
        }
    }

    #[test]
    fn test_purchase_message() {
        let purchase = Purchase {
            order: order(2),
            event_title: "Taco Night".to_string(),
            remaining: 8,
        };
        assert_eq!(
            purchase.message(),
            "Thank you for your purchase! Your order number is #42. 2 tickets have been purchased for $25.00."
        );
    }

    #[test]
    fn test_cancellation_message() {
        let mut cancellation = OrderCancellation {
            order_id: OrderId::new(42),
            event_id: EventId::new(7),
            event_title: "Taco Night".to_string(),
            restocked: Some(2),
        };
        assert_eq!(
            cancellation.message(),
            "The order #42 for the event Taco Night has been cancelled."
        );

        cancellation.restocked = None;
        assert_eq!(cancellation.message(), "The order #42 was already cancelled.");
    }

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        assert!(matches!(
            TicketError::from(RepositoryError::NotFound),
            TicketError::NotFound
        ));
        assert!(matches!(
            TicketError::from(RepositoryError::Conflict("x".into())),
            TicketError::Repository(_)
        ));
    }
}
