//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - All events, soonest first
//! GET  /search?search=text            - Events whose description matches
//! GET  /category/{slug}               - food | drink | cultural | dietary
//!
//! # Events
//! GET  /events/create                 - Create form (auth)
//! POST /events/create                 - Create (auth, multipart)
//! GET  /events/{id}                   - Detail, comments, purchase form
//! GET  /events/{id}/update            - Update form (creator)
//! POST /events/{id}/update            - Save / cancel / reopen (creator, multipart)
//! POST /events/{id}/comment           - Post a comment (auth)
//!
//! # Orders
//! POST /orders/{event_id}/purchase    - Buy tickets (auth)
//! POST /orders/{order_id}/cancel      - Cancel own order (auth)
//!
//! # Account
//! GET  /account/bookings              - Booking history (auth)
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action
//! GET  /auth/register                 - Register page
//! POST /auth/register                 - Register action
//! POST /auth/logout                   - Logout action
//! ```
//!
//! Pages that show statuses run a status pass first so what is displayed is
//! never staler than the request.

pub mod account;
pub mod auth;
pub mod events;
pub mod home;
pub mod orders;
pub mod views;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use sqlx::PgPool;
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::push_flash;
use crate::models::FlashLevel;
use crate::services::status;
use crate::state::AppState;

/// Create the event routes router.
pub fn event_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/create", get(events::create_page).post(events::create))
        .route("/{id}", get(events::show))
        .route("/{id}/update", get(events::update_page).post(events::update))
        .route("/{id}/comment", post(events::comment))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/{event_id}/purchase", post(orders::purchase))
        .route("/{order_id}/cancel", post(orders::cancel))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create all page routes.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/search", get(home::search))
        .route("/category/{slug}", get(home::category))
        .nest("/events", event_routes(max_upload_bytes))
        .nest("/orders", order_routes())
        .route("/account/bookings", get(account::bookings))
        .nest("/auth", auth_routes())
        .fallback(not_found)
}

/// Fallback for unknown paths.
async fn not_found() -> AppError {
    AppError::NotFound("page".to_string())
}

/// Bring statuses up to date before rendering.
///
/// A failed pass is logged and the page is served from the stored statuses;
/// the scheduled refresher will catch up.
pub(crate) async fn refresh_statuses(pool: &PgPool) {
    if let Err(e) = status::refresh_now(pool).await {
        tracing::error!(error = %e, "Status pass before render failed");
    }
}

/// Queue a flash message and redirect.
pub(crate) async fn flash_redirect(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Response {
    push_flash(session, level, message).await;
    Redirect::to(to).into_response()
}
