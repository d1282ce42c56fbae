//! Event listing, search and category pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use foodievent_core::EventCategory;

use super::views::{CategoryLink, EventCard};
use super::{flash_redirect, refresh_statuses};
use crate::db::EventRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{Event, FlashLevel};
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

/// Event listing template, shared by the home, search and category pages.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
    pub heading: String,
    pub search: String,
    pub categories: Vec<CategoryLink>,
    pub events: Vec<EventCard>,
}

impl IndexTemplate {
    fn new(
        state: &AppState,
        page: PageContext,
        heading: impl Into<String>,
        events: &[Event],
    ) -> Self {
        let offset = state.config().utc_offset;
        Self {
            page,
            heading: heading.into(),
            search: String::new(),
            categories: CategoryLink::all(None),
            events: events.iter().map(|e| EventCard::new(e, offset)).collect(),
        }
    }
}

/// Every event, soonest first.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    refresh_statuses(state.pool()).await;

    let events = EventRepository::new(state.pool()).list().await?;
    Ok(IndexTemplate::new(&state, page, "All Events", &events))
}

/// Events whose description contains the search text.
#[instrument(skip(state, session, page))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let text = query.search.trim();
    if text.is_empty() {
        return Ok(flash_redirect(
            &session,
            FlashLevel::Info,
            "Displaying all available events. Please enter text to search.",
            "/",
        )
        .await);
    }

    refresh_statuses(state.pool()).await;
    let events = EventRepository::new(state.pool())
        .search_description(text)
        .await?;

    if events.is_empty() {
        page.flash(
            FlashLevel::Warning,
            format!("No events were found with a description that involves \"{text}\"."),
        );
    } else {
        page.flash(
            FlashLevel::Success,
            "Event has been found with a description that involves the text searched.",
        );
    }

    let mut template =
        IndexTemplate::new(&state, page, format!("Search results for \"{text}\""), &events);
    template.search = text.to_string();
    Ok(template.into_response())
}

/// Events in one category.
#[instrument(skip(state, page))]
pub async fn category(
    State(state): State<AppState>,
    mut page: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let category = EventCategory::from_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    refresh_statuses(state.pool()).await;
    let events = EventRepository::new(state.pool())
        .list_by_category(category)
        .await?;

    let label = category.label();
    if events.is_empty() {
        page.flash(
            FlashLevel::Info,
            format!(
                "No {label} events are available right now. Please create or wait for a {label} event, or browse for a different category that might entice you."
            ),
        );
    }

    let mut template = IndexTemplate::new(&state, page, format!("{label} Events"), &events);
    template.categories = CategoryLink::all(Some(category));
    Ok(template)
}
