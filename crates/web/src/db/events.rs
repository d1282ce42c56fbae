//! Event repository.
//!
//! Listing and lookups borrow the pool. Everything used by creation,
//! purchases, cancellations and edits takes a `&mut PgConnection` so it runs
//! inside the caller's transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use foodievent_core::validation::EventDraft;
use foodievent_core::{EventCategory, EventId, EventStatus, Price, UserId};

use super::{RepositoryError, conflict_or_database};
use crate::models::Event;

/// Columns selected for every [`EventRow`], joined with the creator's name.
const EVENT_COLUMNS: &str = r"
    e.id, e.title, e.image, e.start_time, e.end_time, e.venue, e.vendor_names,
    e.description, e.total_tickets, e.ticket_price, e.free_sampling,
    e.provide_takeaway, e.category, e.status, e.status_date, e.creator_id,
    u.first_name || ' ' || u.surname AS creator_name
";

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i32,
    title: String,
    image: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    venue: String,
    vendor_names: String,
    description: String,
    total_tickets: i32,
    ticket_price: Price,
    free_sampling: bool,
    provide_takeaway: bool,
    category: EventCategory,
    status: EventStatus,
    status_date: DateTime<Utc>,
    creator_id: i32,
    creator_name: String,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::new(row.id),
            title: row.title,
            image: row.image,
            start_time: row.start_time,
            end_time: row.end_time,
            venue: row.venue,
            vendor_names: row.vendor_names,
            description: row.description,
            total_tickets: row.total_tickets,
            ticket_price: row.ticket_price,
            free_sampling: row.free_sampling,
            provide_takeaway: row.provide_takeaway,
            category: row.category,
            status: row.status,
            status_date: row.status_date,
            creator_id: UserId::new(row.creator_id),
            creator_name: row.creator_name,
        }
    }
}

/// An event row locked for the rest of a transaction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedEvent {
    pub id: EventId,
    pub title: String,
    pub status: EventStatus,
    pub end_time: DateTime<Utc>,
    pub total_tickets: i32,
    pub ticket_price: Price,
    pub creator_id: UserId,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for event database operations.
pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every event, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Event>, RepositoryError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM foodievent.events e \
             JOIN foodievent.users u ON u.id = e.creator_id \
             ORDER BY e.start_time, e.id"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Events whose description contains `text`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_description(&self, text: &str) -> Result<Vec<Event>, RepositoryError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM foodievent.events e \
             JOIN foodievent.users u ON u.id = e.creator_id \
             WHERE e.description ILIKE $1 \
             ORDER BY e.start_time, e.id"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(format!("%{}%", escape_like(text)))
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Events in `category`, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category: EventCategory,
    ) -> Result<Vec<Event>, RepositoryError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM foodievent.events e \
             JOIN foodievent.users u ON u.id = e.creator_id \
             WHERE e.category = $1 \
             ORDER BY e.start_time, e.id"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(category)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Get an event by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM foodievent.events e \
             JOIN foodievent.users u ON u.id = e.creator_id \
             WHERE e.id = $1"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Event::from))
    }

    // =========================================================================
    // Transactional queries
    // =========================================================================

    /// Whether another event already uses `title`, ignoring case.
    ///
    /// `except` skips the event being edited. Runs inside the caller's
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn title_taken(
        conn: &mut PgConnection,
        title: &str,
        except: Option<EventId>,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM foodievent.events
                WHERE LOWER(title) = LOWER($1) AND ($2::INTEGER IS NULL OR id <> $2)
            )
            ",
        )
        .bind(title)
        .bind(except)
        .fetch_one(conn)
        .await?;
        Ok(taken)
    }

    /// Insert a new event in the `OPEN` state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the title is already used.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        conn: &mut PgConnection,
        draft: &EventDraft,
        image: &str,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> Result<EventId, RepositoryError> {
        let id: EventId = sqlx::query_scalar(
            r"
            INSERT INTO foodievent.events (
                title, image, start_time, end_time, venue, vendor_names, description,
                total_tickets, ticket_price, free_sampling, provide_takeaway, category,
                status, status_date, creator_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'OPEN', $13, $14)
            RETURNING id
            ",
        )
        .bind(&draft.title)
        .bind(image)
        .bind(draft.start_time)
        .bind(draft.end_time)
        .bind(&draft.venue)
        .bind(&draft.vendor_names)
        .bind(&draft.description)
        .bind(draft.total_tickets)
        .bind(draft.ticket_price)
        .bind(draft.free_sampling)
        .bind(draft.provide_takeaway)
        .bind(draft.category)
        .bind(now)
        .bind(creator)
        .fetch_one(conn)
        .await
        .map_err(|e| conflict_or_database(e, "event title"))?;

        Ok(id)
    }

    /// Lock an event row until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no event has this ID.
    pub async fn lock(conn: &mut PgConnection, id: EventId) -> Result<LockedEvent, RepositoryError> {
        sqlx::query_as::<_, LockedEvent>(
            r"
            SELECT id, title, status, end_time, total_tickets, ticket_price, creator_id
            FROM foodievent.events
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Take `quantity` tickets from the inventory, marking the event sold out
    /// when none remain.
    ///
    /// Returns the remaining count, or `None` when fewer than `quantity`
    /// tickets were left.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn take_tickets(
        conn: &mut PgConnection,
        id: EventId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<i32>, RepositoryError> {
        let remaining: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE foodievent.events
            SET total_tickets = total_tickets - $2,
                status = CASE WHEN total_tickets - $2 = 0
                              THEN 'SOLDOUT'::foodievent.event_status ELSE status END,
                status_date = CASE WHEN total_tickets - $2 = 0 AND status <> 'SOLDOUT'
                                   THEN $3 ELSE status_date END
            WHERE id = $1 AND total_tickets >= $2
            RETURNING total_tickets
            ",
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(conn)
        .await?;
        Ok(remaining)
    }

    /// Put `tickets` back into the inventory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn restock(
        conn: &mut PgConnection,
        id: EventId,
        tickets: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE foodievent.events SET total_tickets = total_tickets + $2 WHERE id = $1")
            .bind(id)
            .bind(tickets)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Set the status and stamp `status_date`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: EventId,
        status: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE foodievent.events SET status = $2, status_date = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(now)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Overwrite the editable fields of an event.
    ///
    /// `image` is left unchanged when `None`. Status and `status_date` are
    /// not touched here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new title is already used.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_details(
        conn: &mut PgConnection,
        id: EventId,
        draft: &EventDraft,
        image: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE foodievent.events
            SET title = $2,
                image = COALESCE($3, image),
                start_time = $4,
                end_time = $5,
                venue = $6,
                vendor_names = $7,
                description = $8,
                total_tickets = $9,
                ticket_price = $10,
                free_sampling = $11,
                provide_takeaway = $12,
                category = $13
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&draft.title)
        .bind(image)
        .bind(draft.start_time)
        .bind(draft.end_time)
        .bind(&draft.venue)
        .bind(&draft.vendor_names)
        .bind(&draft.description)
        .bind(draft.total_tickets)
        .bind(draft.ticket_price)
        .bind(draft.free_sampling)
        .bind(draft.provide_takeaway)
        .bind(draft.category)
        .execute(conn)
        .await
        .map_err(|e| conflict_or_database(e, "event title"))?;
        Ok(())
    }
}

/// Escape `%`, `_` and `\` so user text matches literally inside `ILIKE`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
