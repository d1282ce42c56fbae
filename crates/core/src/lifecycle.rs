//! Status engine.
//!
//! Event and ticket states are never set by hand except for the ledger
//! transitions (sell-out, cancellation, reopen). Everything else is derived
//! from the clock and the remaining inventory by the functions in this module.
//!
//! The derivation is pure: the caller supplies `now`, loads the rows, and
//! writes back whatever [`refresh`] reports as changed. Running [`refresh`]
//! twice with the same `now` changes nothing the second time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{EventId, EventStatus, OrderId, TicketStatus};

/// The fields of an event that its status depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventState {
    pub id: EventId,
    pub status: EventStatus,
    pub status_date: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Remaining inventory.
    pub total_tickets: i32,
}

/// The fields of an order that its ticket status depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketState {
    pub id: OrderId,
    pub event_id: EventId,
    pub status: TicketStatus,
}

/// Rows touched by a [`refresh`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub events_changed: Vec<EventId>,
    pub tickets_changed: Vec<OrderId>,
}

impl RefreshReport {
    /// True when the pass left every row as it was.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events_changed.is_empty() && self.tickets_changed.is_empty()
    }
}

/// Derive an event's status.
///
/// Rules, first match wins:
///
/// 1. Cancelled before the end time stays cancelled.
/// 2. Cancelled after the end time becomes inactive.
/// 3. No remaining tickets is sold out.
/// 4. Before the end time is open.
/// 5. Otherwise inactive.
#[must_use]
pub fn derive_event_status(
    current: EventStatus,
    end_time: DateTime<Utc>,
    total_tickets: i32,
    now: DateTime<Utc>,
) -> EventStatus {
    let ended = now > end_time;

    if current == EventStatus::Cancelled {
        return if ended {
            EventStatus::Inactive
        } else {
            EventStatus::Cancelled
        };
    }

    if total_tickets <= 0 {
        EventStatus::Soldout
    } else if ended {
        EventStatus::Inactive
    } else {
        EventStatus::Open
    }
}

/// Derive an order's ticket status from its event's freshly derived status.
///
/// A cancelled ticket never comes back to life: once the event ends it decays
/// to inactive like every other ticket.
#[must_use]
pub fn derive_ticket_status(
    current: TicketStatus,
    event_status: EventStatus,
    event_end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> TicketStatus {
    let ended = now > event_end_time;

    match event_status {
        EventStatus::Cancelled => TicketStatus::Cancelled,
        EventStatus::Inactive => TicketStatus::Inactive,
        EventStatus::Open | EventStatus::Soldout => match (current, ended) {
            (_, true) => TicketStatus::Inactive,
            (TicketStatus::Cancelled, false) => TicketStatus::Cancelled,
            (_, false) => TicketStatus::Active,
        },
    }
}

/// Recompute every event and then every ticket in place.
///
/// Events are finalized first because a ticket's status depends on its
/// event's new status. Changed events get `status_date = now`. Tickets whose
/// event is not in `events` are left untouched.
pub fn refresh(
    events: &mut [EventState],
    tickets: &mut [TicketState],
    now: DateTime<Utc>,
) -> RefreshReport {
    let mut report = RefreshReport::default();

    for event in events.iter_mut() {
        let derived = derive_event_status(event.status, event.end_time, event.total_tickets, now);
        if derived != event.status {
            event.status = derived;
            event.status_date = now;
            report.events_changed.push(event.id);
        }
    }

    let parents: HashMap<EventId, (EventStatus, DateTime<Utc>)> = events
        .iter()
        .map(|e| (e.id, (e.status, e.end_time)))
        .collect();

    for ticket in tickets.iter_mut() {
        let Some(&(event_status, end_time)) = parents.get(&ticket.event_id) else {
            continue;
        };
        let derived = derive_ticket_status(ticket.status, event_status, end_time, now);
        if derived != ticket.status {
            ticket.status = derived;
            report.tickets_changed.push(ticket.id);
        }
    }

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn event(id: i32, status: EventStatus, end_offset_hours: i64, total: i32) -> EventState {
        EventState {
            id: EventId::new(id),
            status,
            status_date: now() - Duration::days(7),
            end_time: now() + Duration::hours(end_offset_hours),
            total_tickets: total,
        }
    }

    fn ticket(id: i32, event_id: i32, status: TicketStatus) -> TicketState {
        TicketState {
            id: OrderId::new(id),
            event_id: EventId::new(event_id),
            status,
        }
    }

    #[test]
    fn test_cancelled_is_sticky_until_end() {
        let end = now() + Duration::hours(1);
        assert_eq!(
            derive_event_status(EventStatus::Cancelled, end, 0, now()),
            EventStatus::Cancelled
        );
        assert_eq!(
            derive_event_status(EventStatus::Cancelled, end, 50, end),
            EventStatus::Cancelled
        );
        assert_eq!(
            derive_event_status(EventStatus::Cancelled, end, 50, end + Duration::seconds(1)),
            EventStatus::Inactive
        );
    }

    #[test]
    fn test_soldout_outranks_open_and_inactive() {
        let future = now() + Duration::hours(3);
        let past = now() - Duration::hours(3);
        assert_eq!(
            derive_event_status(EventStatus::Open, future, 0, now()),
            EventStatus::Soldout
        );
        assert_eq!(
            derive_event_status(EventStatus::Inactive, past, -2, now()),
            EventStatus::Soldout
        );
    }

    #[test]
    fn test_open_until_end_then_inactive() {
        let end = now();
        assert_eq!(
            derive_event_status(EventStatus::Soldout, end, 4, now()),
            EventStatus::Open
        );
        assert_eq!(
            derive_event_status(EventStatus::Open, end, 4, now() + Duration::minutes(1)),
            EventStatus::Inactive
        );
    }

    #[test]
    fn test_ticket_follows_cancelled_and_inactive_events() {
        let future = now() + Duration::hours(2);
        for current in [TicketStatus::Active, TicketStatus::Inactive, TicketStatus::Cancelled] {
            assert_eq!(
                derive_ticket_status(current, EventStatus::Cancelled, future, now()),
                TicketStatus::Cancelled
            );
            assert_eq!(
                derive_ticket_status(current, EventStatus::Inactive, future, now()),
                TicketStatus::Inactive
            );
        }
    }

    #[test]
    fn test_cancelled_ticket_expires_instead_of_reactivating() {
        let end = now() + Duration::hours(2);
        assert_eq!(
            derive_ticket_status(TicketStatus::Cancelled, EventStatus::Open, end, now()),
            TicketStatus::Cancelled
        );
        assert_eq!(
            derive_ticket_status(
                TicketStatus::Cancelled,
                EventStatus::Open,
                end,
                end + Duration::hours(1)
            ),
            TicketStatus::Inactive
        );
    }

    #[test]
    fn test_ticket_active_on_soldout_event() {
        let end = now() + Duration::hours(2);
        assert_eq!(
            derive_ticket_status(TicketStatus::Inactive, EventStatus::Soldout, end, now()),
            TicketStatus::Active
        );
    }

    #[test]
    fn test_refresh_uses_fresh_event_status_for_tickets() {
        // Cancelled event that has just ended: event goes INACTIVE, so its
        // cancelled tickets must follow to INACTIVE in the same pass.
        let mut events = vec![event(1, EventStatus::Cancelled, -1, 5)];
        let mut tickets = vec![ticket(10, 1, TicketStatus::Cancelled)];

        let report = refresh(&mut events, &mut tickets, now());

        assert_eq!(events[0].status, EventStatus::Inactive);
        assert_eq!(events[0].status_date, now());
        assert_eq!(tickets[0].status, TicketStatus::Inactive);
        assert_eq!(report.events_changed, vec![EventId::new(1)]);
        assert_eq!(report.tickets_changed, vec![OrderId::new(10)]);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut events = vec![
            event(1, EventStatus::Open, 5, 0),
            event(2, EventStatus::Open, -5, 10),
            event(3, EventStatus::Cancelled, 5, 10),
            event(4, EventStatus::Soldout, 5, 3),
        ];
        let mut tickets = vec![
            ticket(1, 1, TicketStatus::Active),
            ticket(2, 2, TicketStatus::Active),
            ticket(3, 3, TicketStatus::Active),
            ticket(4, 4, TicketStatus::Cancelled),
            ticket(5, 4, TicketStatus::Inactive),
        ];

        let first = refresh(&mut events, &mut tickets, now());
        assert!(!first.is_empty());

        let snapshot = (events.clone(), tickets.clone());
        let second = refresh(&mut events, &mut tickets, now());

        assert!(second.is_empty());
        assert_eq!((events, tickets), snapshot);
    }

    #[test]
    fn test_refresh_leaves_unchanged_rows_alone() {
        let mut events = vec![event(1, EventStatus::Open, 5, 10)];
        let before = events[0].status_date;
        let mut tickets = vec![ticket(1, 1, TicketStatus::Active)];

        let report = refresh(&mut events, &mut tickets, now());

        assert!(report.is_empty());
        assert_eq!(events[0].status_date, before);
    }

    #[test]
    fn test_no_active_ticket_on_cancelled_or_inactive_event() {
        let mut events = vec![
            event(1, EventStatus::Cancelled, 5, 10),
            event(2, EventStatus::Open, -1, 10),
        ];
        let mut tickets = vec![
            ticket(1, 1, TicketStatus::Active),
            ticket(2, 2, TicketStatus::Active),
        ];

        refresh(&mut events, &mut tickets, now());

        for t in &tickets {
            assert_ne!(t.status, TicketStatus::Active);
        }
    }

    #[test]
    fn test_orphan_ticket_is_skipped() {
        let mut tickets = vec![ticket(1, 99, TicketStatus::Active)];
        let report = refresh(&mut [], &mut tickets, now());
        assert!(report.is_empty());
        assert_eq!(tickets[0].status, TicketStatus::Active);
    }
}
