//! Order repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use foodievent_core::ledger::{OrderLine, PurchasePlan};
use foodievent_core::{EventId, OrderId, Price, TicketStatus, UserId};

use super::RepositoryError;
use crate::models::{Booking, Order};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    event_id: EventId,
    tickets_purchased: i32,
    purchase_ticket_price: Price,
    purchased_amount: Price,
    ticket_status: TicketStatus,
    booking_time: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            tickets_purchased: row.tickets_purchased,
            purchase_ticket_price: row.purchase_ticket_price,
            purchased_amount: row.purchased_amount,
            ticket_status: row.ticket_status,
            booking_time: row.booking_time,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    #[sqlx(flatten)]
    order: OrderRow,
    event_title: String,
    event_image: String,
    event_start_time: DateTime<Utc>,
    event_venue: String,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            order: row.order.into(),
            event_title: row.event_title,
            event_image: row.event_image,
            event_start_time: row.event_start_time,
            event_venue: row.event_venue,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: OrderId,
    tickets_purchased: i32,
    purchased_amount: Price,
    ticket_status: TicketStatus,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: row.id,
            tickets_purchased: row.tickets_purchased,
            purchased_amount: row.purchased_amount,
            status: row.ticket_status,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's bookings, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn bookings_for_user(&self, user: UserId) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r"
            SELECT o.id, o.user_id, o.event_id, o.tickets_purchased,
                   o.purchase_ticket_price, o.purchased_amount, o.ticket_status,
                   o.booking_time,
                   e.title AS event_title, e.image AS event_image,
                   e.start_time AS event_start_time, e.venue AS event_venue
            FROM foodievent.orders o
            JOIN foodievent.events e ON e.id = o.event_id
            WHERE o.user_id = $1
            ORDER BY o.booking_time DESC, o.id DESC
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Record a purchase as an `ACTIVE` order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        conn: &mut PgConnection,
        user: UserId,
        event: EventId,
        plan: &PurchasePlan,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO foodievent.orders (
                tickets_purchased, purchase_ticket_price, purchased_amount,
                ticket_status, booking_time, user_id, event_id
            )
            VALUES ($1, $2, $3, 'ACTIVE', $4, $5, $6)
            RETURNING id, user_id, event_id, tickets_purchased, purchase_ticket_price,
                      purchased_amount, ticket_status, booking_time
            ",
        )
        .bind(plan.quantity)
        .bind(plan.unit_price)
        .bind(plan.amount)
        .bind(now)
        .bind(user)
        .bind(event)
        .fetch_one(conn)
        .await?;

        Ok(row.into())
    }

    /// The event an order belongs to, without locking anything.
    ///
    /// Callers lock the event before the order, matching the lock order of
    /// purchases and event cancellations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn event_of(conn: &mut PgConnection, id: OrderId) -> Result<EventId, RepositoryError> {
        sqlx::query_scalar::<_, EventId>("SELECT event_id FROM foodievent.orders WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Lock an order row until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn lock(conn: &mut PgConnection, id: OrderId) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, event_id, tickets_purchased, purchase_ticket_price,
                   purchased_amount, ticket_status, booking_time
            FROM foodievent.orders
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?
        .map(Order::from)
        .ok_or(RepositoryError::NotFound)
    }

    /// Lock and return the ledger lines of every order for an event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_lines_for_event(
        conn: &mut PgConnection,
        event: EventId,
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT id, tickets_purchased, purchased_amount, ticket_status
            FROM foodievent.orders
            WHERE event_id = $1
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(event)
        .fetch_all(conn)
        .await?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    /// Mark orders as `CANCELLED`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn cancel(conn: &mut PgConnection, ids: &[OrderId]) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i32> = ids.iter().map(OrderId::as_i32).collect();
        let result = sqlx::query(
            "UPDATE foodievent.orders SET ticket_status = 'CANCELLED' WHERE id = ANY($1)",
        )
        .bind(&ids)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }
}
