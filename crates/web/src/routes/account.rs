//! Account pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::refresh_statuses;
use super::views::{BookingView, CategoryLink};
use crate::db::OrderRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::state::AppState;

/// Booking history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/bookings.html")]
pub struct BookingsTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryLink>,
    pub bookings: Vec<BookingView>,
}

/// The logged-in user's orders, most recent first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn bookings(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<impl IntoResponse> {
    refresh_statuses(state.pool()).await;

    let offset = state.config().utc_offset;
    let bookings = OrderRepository::new(state.pool())
        .bookings_for_user(user.id)
        .await?
        .iter()
        .map(|b| BookingView::new(b, offset))
        .collect();

    Ok(BookingsTemplate {
        page,
        categories: CategoryLink::all(None),
        bookings,
    })
}
