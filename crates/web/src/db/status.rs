//! Persistence for the status engine.
//!
//! One pass reads every event and order without locking them, lets
//! [`foodievent_core::lifecycle::refresh`] derive the new states and writes
//! back only the rows that changed, inside one transaction.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use foodievent_core::lifecycle::{self, EventState, RefreshReport, TicketState};
use foodievent_core::{EventId, EventStatus, OrderId, TicketStatus};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct EventStateRow {
    id: EventId,
    status: EventStatus,
    status_date: DateTime<Utc>,
    end_time: DateTime<Utc>,
    total_tickets: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct TicketStateRow {
    id: OrderId,
    event_id: EventId,
    ticket_status: TicketStatus,
}

/// Repository running status passes.
pub struct StatusRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatusRepository<'a> {
    /// Create a new status repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Recompute and store every event and ticket status as of `now`.
    ///
    /// Nothing is locked. Each write only applies while the row still holds
    /// the values the pass read, so a row changed by a concurrent purchase,
    /// cancellation or edit is skipped and picked up by the next pass. The
    /// returned report lists only the rows actually written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails; nothing is
    /// written in that case.
    pub async fn refresh_all(&self, now: DateTime<Utc>) -> Result<RefreshReport, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let pass = evaluate(&mut tx, now).await?;
        if pass.report.is_empty() {
            tx.commit().await?;
            return Ok(pass.report);
        }

        let mut written = RefreshReport::default();

        for (before, after) in pass.changed_events() {
            let result = sqlx::query(
                r"
                UPDATE foodievent.events
                SET status = $2, status_date = $3
                WHERE id = $1 AND status = $4 AND total_tickets = $5
                ",
            )
            .bind(after.id)
            .bind(after.status)
            .bind(after.status_date)
            .bind(before.status)
            .bind(before.total_tickets)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 1 {
                written.events_changed.push(after.id);
            }
        }

        for (before, after) in pass.changed_tickets() {
            let result = sqlx::query(
                r"
                UPDATE foodievent.orders
                SET ticket_status = $2
                WHERE id = $1 AND ticket_status = $3
                ",
            )
            .bind(after.id)
            .bind(after.status)
            .bind(before.status)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 1 {
                written.tickets_changed.push(after.id);
            }
        }

        tx.commit().await?;

        let skipped = pass.report.events_changed.len() + pass.report.tickets_changed.len()
            - written.events_changed.len()
            - written.tickets_changed.len();
        tracing::debug!(
            events = written.events_changed.len(),
            tickets = written.tickets_changed.len(),
            skipped,
            "Status pass updated rows"
        );

        Ok(written)
    }

    /// Report what a pass at `now` would change, without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn preview(&self, now: DateTime<Utc>) -> Result<RefreshReport, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let pass = evaluate(&mut conn, now).await?;
        Ok(pass.report)
    }
}

/// The rows one pass read and the states derived from them.
struct Pass {
    events_before: Vec<EventState>,
    events: Vec<EventState>,
    tickets_before: Vec<TicketState>,
    tickets: Vec<TicketState>,
    report: RefreshReport,
}

impl Pass {
    fn changed_events(&self) -> impl Iterator<Item = (&EventState, &EventState)> {
        let changed: HashSet<EventId> = self.report.events_changed.iter().copied().collect();
        self.events_before
            .iter()
            .zip(&self.events)
            .filter(move |(_, after)| changed.contains(&after.id))
    }

    fn changed_tickets(&self) -> impl Iterator<Item = (&TicketState, &TicketState)> {
        let changed: HashSet<OrderId> = self.report.tickets_changed.iter().copied().collect();
        self.tickets_before
            .iter()
            .zip(&self.tickets)
            .filter(move |(_, after)| changed.contains(&after.id))
    }
}

/// Load every event and order, then derive their states at `now`.
async fn evaluate(conn: &mut PgConnection, now: DateTime<Utc>) -> Result<Pass, RepositoryError> {
    let events_before: Vec<EventState> = sqlx::query_as::<_, EventStateRow>(
        r"
        SELECT id, status, status_date, end_time, total_tickets
        FROM foodievent.events
        ORDER BY id
        ",
    )
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|row| EventState {
        id: row.id,
        status: row.status,
        status_date: row.status_date,
        end_time: row.end_time,
        total_tickets: row.total_tickets,
    })
    .collect();

    let tickets_before: Vec<TicketState> = sqlx::query_as::<_, TicketStateRow>(
        r"
        SELECT id, event_id, ticket_status
        FROM foodievent.orders
        ORDER BY id
        ",
    )
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|row| TicketState {
        id: row.id,
        event_id: row.event_id,
        status: row.ticket_status,
    })
    .collect();

    let mut events = events_before.clone();
    let mut tickets = tickets_before.clone();
    let report = lifecycle::refresh(&mut events, &mut tickets, now);

    Ok(Pass {
        events_before,
        events,
        tickets_before,
        tickets,
        report,
    })
}
