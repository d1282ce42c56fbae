//! Scenario harness for FoodieVent.
//!
//! [`BoxOffice`] keeps events and orders in memory and applies the ledger and
//! status engine from `foodievent-core` in the same order the web services do
//! inside their transactions: derive the event's status at `now`, plan, then
//! apply the plan. Tests in `tests/` drive it through whole user journeys.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p foodievent-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Duration, TimeZone, Utc};

use foodievent_core::ledger::{
    self, CancellationSummary, Inventory, OrderLine, PurchasePlan,
};
use foodievent_core::lifecycle::{self, EventState, RefreshReport, TicketState};
use foodievent_core::{EventId, EventStatus, LedgerError, OrderId, Price, TicketStatus};

/// A fixed clock: 1 June 2025, 00:00 UTC.
#[must_use]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `base_time()` plus `hours`.
#[must_use]
pub fn hours(hours: i64) -> DateTime<Utc> {
    base_time() + Duration::hours(hours)
}

/// Parse a dollar amount.
///
/// # Panics
///
/// Panics if `amount` is not a valid price.
#[must_use]
pub fn dollars(amount: &str) -> Price {
    match Price::parse(amount) {
        Ok(price) => price,
        Err(e) => panic!("bad test price {amount:?}: {e}"),
    }
}

/// A stored event.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub state: EventState,
    pub ticket_price: Price,
}

/// A stored order.
#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub id: OrderId,
    pub event_id: EventId,
    pub tickets_purchased: i32,
    pub purchased_amount: Price,
    pub ticket_status: TicketStatus,
}

impl StoredOrder {
    fn line(&self) -> OrderLine {
        OrderLine {
            id: self.id,
            tickets_purchased: self.tickets_purchased,
            purchased_amount: self.purchased_amount,
            status: self.ticket_status,
        }
    }
}

/// In-memory events and orders.
#[derive(Debug, Default)]
pub struct BoxOffice {
    events: Vec<StoredEvent>,
    orders: Vec<StoredOrder>,
}

impl BoxOffice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an open event ending at `end_time`.
    pub fn add_event(
        &mut self,
        end_time: DateTime<Utc>,
        total_tickets: i32,
        ticket_price: Price,
    ) -> EventId {
        let id = EventId::new(next_id(self.events.len()));
        self.events.push(StoredEvent {
            state: EventState {
                id,
                status: EventStatus::Open,
                status_date: base_time(),
                end_time,
                total_tickets,
            },
            ticket_price,
        });
        id
    }

    /// Look up an event.
    ///
    /// # Panics
    ///
    /// Panics if the event does not exist.
    #[must_use]
    pub fn event(&self, id: EventId) -> &StoredEvent {
        self.events
            .iter()
            .find(|e| e.state.id == id)
            .unwrap_or_else(|| panic!("no event {id}"))
    }

    /// Look up an order.
    ///
    /// # Panics
    ///
    /// Panics if the order does not exist.
    #[must_use]
    pub fn order(&self, id: OrderId) -> &StoredOrder {
        self.orders
            .iter()
            .find(|o| o.id == id)
            .unwrap_or_else(|| panic!("no order {id}"))
    }

    /// Orders of one event.
    pub fn orders_for(&self, event: EventId) -> impl Iterator<Item = &StoredOrder> {
        self.orders.iter().filter(move |o| o.event_id == event)
    }

    /// Buy tickets at `now`.
    ///
    /// # Errors
    ///
    /// Returns the ledger's refusal; nothing changes in that case.
    pub fn purchase(
        &mut self,
        event_id: EventId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<(OrderId, PurchasePlan), LedgerError> {
        let event = self.event_mut(event_id);
        let status = lifecycle::derive_event_status(
            event.state.status,
            event.state.end_time,
            event.state.total_tickets,
            now,
        );
        let plan = ledger::plan_purchase(
            &Inventory {
                status,
                total_tickets: event.state.total_tickets,
                ticket_price: event.ticket_price,
            },
            quantity,
        )?;

        event.state.total_tickets = plan.remaining;
        if plan.sold_out {
            event.state.status = EventStatus::Soldout;
            event.state.status_date = now;
        }

        let id = OrderId::new(next_id(self.orders.len()));
        self.orders.push(StoredOrder {
            id,
            event_id,
            tickets_purchased: plan.quantity,
            purchased_amount: plan.amount,
            ticket_status: TicketStatus::Active,
        });
        Ok((id, plan))
    }

    /// Cancel one order, returning the tickets put back (if any).
    pub fn cancel_order(&mut self, order_id: OrderId) -> Option<i32> {
        let order = self.order(order_id);
        let event_id = order.event_id;
        let restock = ledger::cancel_order(&order.line())?;

        self.event_mut(event_id).state.total_tickets += restock.tickets;
        self.order_mut(order_id).ticket_status = TicketStatus::Cancelled;
        Some(restock.tickets)
    }

    /// Cancel an event and its active orders.
    ///
    /// Returns `None` when the event was already cancelled.
    pub fn cancel_event(
        &mut self,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> Option<CancellationSummary> {
        let lines: Vec<OrderLine> = self.orders_for(event_id).map(StoredOrder::line).collect();
        let summary = ledger::plan_event_cancellation(self.event(event_id).state.status, &lines)?;

        for id in &summary.order_ids {
            self.order_mut(*id).ticket_status = TicketStatus::Cancelled;
        }
        let event = self.event_mut(event_id);
        event.state.total_tickets += summary.tickets_to_return;
        event.state.status = EventStatus::Cancelled;
        event.state.status_date = now;
        Some(summary)
    }

    /// Re-open a cancelled event.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotCancelled`] for any other status.
    pub fn reopen(&mut self, event_id: EventId, now: DateTime<Utc>) -> Result<(), LedgerError> {
        let event = self.event_mut(event_id);
        event.state.status = ledger::reopen(event.state.status)?;
        event.state.status_date = now;
        Ok(())
    }

    /// Run a status pass at `now`.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> RefreshReport {
        let mut events: Vec<EventState> = self.events.iter().map(|e| e.state.clone()).collect();
        let mut tickets: Vec<TicketState> = self
            .orders
            .iter()
            .map(|o| TicketState {
                id: o.id,
                event_id: o.event_id,
                status: o.ticket_status,
            })
            .collect();

        let report = lifecycle::refresh(&mut events, &mut tickets, now);

        for (stored, state) in self.events.iter_mut().zip(events) {
            stored.state = state;
        }
        for (stored, state) in self.orders.iter_mut().zip(tickets) {
            stored.ticket_status = state.status;
        }
        report
    }

    fn event_mut(&mut self, id: EventId) -> &mut StoredEvent {
        self.events
            .iter_mut()
            .find(|e| e.state.id == id)
            .unwrap_or_else(|| panic!("no event {id}"))
    }

    fn order_mut(&mut self, id: OrderId) -> &mut StoredOrder {
        self.orders
            .iter_mut()
            .find(|o| o.id == id)
            .unwrap_or_else(|| panic!("no order {id}"))
    }
}

/// Ids start at 1, like the database's serial columns.
fn next_id(len: usize) -> i32 {
    i32::try_from(len + 1).unwrap_or(i32::MAX)
}
