//! Ticket purchase and order cancellation actions.

use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use foodievent_core::validation::purchase_quantity;
use foodievent_core::{EventId, OrderId};

use super::flash_redirect;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::FlashLevel;
use crate::services::{TicketError, TicketService};
use crate::state::AppState;

/// Purchase form data.
#[derive(Debug, Deserialize)]
pub struct PurchaseForm {
    #[serde(default)]
    pub quantity: String,
}

/// Buy tickets for an event.
///
/// Refusals (bad quantity, not on sale, too few left) flash a message on the
/// event page and change nothing.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn purchase(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(event_id): Path<i32>,
    Form(form): Form<PurchaseForm>,
) -> Result<Response> {
    let event_id = EventId::new(event_id);
    let event_page = format!("/events/{event_id}");

    let quantity = match purchase_quantity(&form.quantity) {
        Ok(quantity) => quantity,
        Err(message) => {
            return Ok(flash_redirect(&session, FlashLevel::Danger, message, &event_page).await);
        }
    };

    let result = TicketService::new(state.pool())
        .purchase(user.id, event_id, quantity, Utc::now())
        .await;

    match result {
        Ok(purchase) => {
            let order_id = purchase.order.id.to_string();
            add_breadcrumb("tickets", "Purchased tickets", Some(&[("order_id", order_id.as_str())]));
            Ok(flash_redirect(
                &session,
                FlashLevel::Success,
                purchase.message(),
                "/account/bookings",
            )
            .await)
        }
        Err(TicketError::Ledger(e)) => {
            Ok(flash_redirect(&session, FlashLevel::Warning, e.to_string(), &event_page).await)
        }
        Err(TicketError::NotFound) => Err(AppError::NotFound(format!("event {event_id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Cancel one of the user's own orders.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(order_id): Path<i32>,
) -> Result<Response> {
    let order_id = OrderId::new(order_id);

    let result = TicketService::new(state.pool())
        .cancel_order(user.id, order_id)
        .await;

    match result {
        Ok(cancellation) => {
            let level = if cancellation.restocked.is_some() {
                FlashLevel::Success
            } else {
                FlashLevel::Info
            };
            Ok(flash_redirect(&session, level, cancellation.message(), "/account/bookings").await)
        }
        Err(TicketError::Forbidden) => Ok(flash_redirect(
            &session,
            FlashLevel::Warning,
            TicketError::Forbidden.to_string(),
            "/account/bookings",
        )
        .await),
        Err(TicketError::NotFound) => Err(AppError::NotFound(format!("order {order_id}"))),
        Err(e) => Err(e.into()),
    }
}
