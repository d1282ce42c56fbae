//! Event cancellation, re-opening and the scheduled status pass.

#![allow(clippy::unwrap_used)]

use foodievent_core::{EventStatus, LedgerError, TicketStatus};
use foodievent_integration_tests::{BoxOffice, dollars, hours};

#[test]
fn test_cancelling_an_event_refunds_active_orders() {
    let mut office = BoxOffice::new();
    let event = office.add_event(hours(48), 20, dollars("10"));
    let (three, _) = office.purchase(event, 3, hours(1)).unwrap();
    let (five, _) = office.purchase(event, 5, hours(2)).unwrap();

    let summary = office.cancel_event(event, hours(3)).unwrap();

    assert_eq!(summary.tickets_to_return, 8);
    assert_eq!(summary.total_refund, dollars("80"));
    assert_eq!(summary.order_ids, vec![three, five]);
    assert_eq!(
        summary.message("Taco Night"),
        "Taco Night has been cancelled. 8 tickets have been refunded and resupplied. Total amount refunded: $80.00"
    );

    let stored = &office.event(event).state;
    assert_eq!(stored.status, EventStatus::Cancelled);
    assert_eq!(stored.status_date, hours(3));
    assert_eq!(stored.total_tickets, 20);
    assert!(
        office
            .orders_for(event)
            .all(|o| o.ticket_status == TicketStatus::Cancelled)
    );
}

#[test]
fn test_event_cancellation_skips_orders_already_cancelled() {
    let mut office = BoxOffice::new();
    let event = office.add_event(hours(48), 20, dollars("10"));
    let (early, _) = office.purchase(event, 2, hours(1)).unwrap();
    office.purchase(event, 6, hours(1)).unwrap();
    office.cancel_order(early);

    let summary = office.cancel_event(event, hours(2)).unwrap();

    assert_eq!(summary.tickets_to_return, 6);
    assert_eq!(summary.total_refund, dollars("60"));
    // 2 restocked by the order cancel, 6 by the event cancel
    assert_eq!(office.event(event).state.total_tickets, 20);
}

#[test]
fn test_cancelling_twice_is_a_no_op() {
    let mut office = BoxOffice::new();
    let event = office.add_event(hours(48), 10, dollars("10"));
    office.purchase(event, 4, hours(1)).unwrap();

    assert!(office.cancel_event(event, hours(2)).is_some());
    assert!(office.cancel_event(event, hours(3)).is_none());
    assert_eq!(office.event(event).state.total_tickets, 10);
    assert_eq!(office.event(event).state.status_date, hours(2));
}

#[test]
fn test_cancelled_event_is_not_on_sale() {
    let mut office = BoxOffice::new();
    let event = office.add_event(hours(48), 10, dollars("10"));
    office.cancel_event(event, hours(1));

    assert_eq!(
        office.purchase(event, 1, hours(2)).unwrap_err(),
        LedgerError::NotOnSale(EventStatus::Cancelled)
    );
}

#[test]
fn test_reopen_only_from_cancelled() {
    let mut office = BoxOffice::new();
    let event = office.add_event(hours(48), 10, dollars("10"));

    assert_eq!(
        office.reopen(event, hours(1)).unwrap_err(),
        LedgerError::NotCancelled(EventStatus::Open)
    );

    office.cancel_event(event, hours(1));
    office.reopen(event, hours(2)).unwrap();
    assert_eq!(office.event(event).state.status, EventStatus::Open);
    assert!(office.purchase(event, 1, hours(3)).is_ok());
}

#[test]
fn test_ended_events_and_their_tickets_go_inactive() {
    let mut office = BoxOffice::new();
    let event = office.add_event(hours(5), 10, dollars("10"));
    let (order, _) = office.purchase(event, 2, hours(1)).unwrap();

    assert!(office.refresh(hours(4)).is_empty());

    let report = office.refresh(hours(6));
    assert_eq!(report.events_changed, vec![event]);
    assert_eq!(report.tickets_changed, vec![order]);
    assert_eq!(office.event(event).state.status, EventStatus::Inactive);
    assert_eq!(office.event(event).state.status_date, hours(6));
    assert_eq!(office.order(order).ticket_status, TicketStatus::Inactive);
}

#[test]
fn test_cancelled_event_decays_to_inactive_after_it_ends() {
    let mut office = BoxOffice::new();
    let event = office.add_event(hours(5), 10, dollars("10"));
    let (order, _) = office.purchase(event, 2, hours(1)).unwrap();
    office.cancel_event(event, hours(2));

    // Still before the end: nothing moves
    assert!(office.refresh(hours(3)).is_empty());

    office.refresh(hours(6));
    assert_eq!(office.event(event).state.status, EventStatus::Inactive);
    assert_eq!(office.order(order).ticket_status, TicketStatus::Inactive);
}

#[test]
fn test_refresh_is_idempotent_for_a_fixed_clock() {
    let mut office = BoxOffice::new();
    let ending = office.add_event(hours(5), 10, dollars("10"));
    let selling = office.add_event(hours(50), 3, dollars("8"));
    office.purchase(ending, 4, hours(1)).unwrap();
    office.purchase(selling, 3, hours(1)).unwrap();
    office.cancel_event(selling, hours(2));

    let first = office.refresh(hours(10));
    assert!(!first.is_empty());
    assert!(office.refresh(hours(10)).is_empty());
}

#[test]
fn test_no_active_ticket_under_a_closed_event() {
    let mut office = BoxOffice::new();
    let cancelled = office.add_event(hours(48), 10, dollars("10"));
    let ended = office.add_event(hours(5), 10, dollars("10"));
    let open = office.add_event(hours(48), 10, dollars("10"));
    for event in [cancelled, ended, open] {
        office.purchase(event, 2, hours(1)).unwrap();
    }
    office.cancel_event(cancelled, hours(2));
    office.refresh(hours(6));

    for event in [cancelled, ended] {
        assert!(
            office
                .orders_for(event)
                .all(|o| o.ticket_status != TicketStatus::Active)
        );
    }
    assert!(
        office
            .orders_for(open)
            .all(|o| o.ticket_status == TicketStatus::Active)
    );
}
