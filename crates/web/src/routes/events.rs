//! Event pages: detail, create, update and comments.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use foodievent_core::validation::EventInput;
use foodievent_core::{EventCategory, EventId, ValidationErrors};

use super::views::{CategoryLink, CommentView, EventView, event_input};
use super::{flash_redirect, refresh_statuses};
use crate::db::{CommentRepository, EventRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::FlashLevel;
use crate::services::{EventAction, EventError, EventService, ImageUpload};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Comment form data.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub contents: String,
}

/// A decoded multipart event form.
#[derive(Debug, Default)]
pub struct EventForm {
    pub input: EventInput,
    pub image: Option<ImageUpload>,
    pub action: EventAction,
}

impl EventForm {
    /// Read every known field of a multipart body.
    ///
    /// An empty file input (no file chosen) is treated as no image.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart or
    /// exceeds the upload limit.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if !filename.is_empty() && !bytes.is_empty() {
                    form.image = Some(ImageUpload { filename, bytes });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            let input = &mut form.input;
            match name.as_str() {
                "title" => input.title = value,
                "description" => input.description = value,
                "start_time" => input.start_time = value,
                "end_time" => input.end_time = value,
                "venue" => input.venue = value,
                "vendor_names" => input.vendor_names = value,
                "total_tickets" => input.total_tickets = value,
                "ticket_price" => input.ticket_price = value,
                "category" => input.category = value,
                "free_sampling" => input.free_sampling = true,
                "provide_takeaway" => input.provide_takeaway = true,
                "action" => form.action = EventAction::from_form(Some(value.as_str())),
                _ => {}
            }
        }

        Ok(form)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Event detail template.
#[derive(Template, WebTemplate)]
#[template(path = "events/show.html")]
pub struct ShowTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryLink>,
    pub event: EventView,
    pub comments: Vec<CommentView>,
}

/// A category option in the event form.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub value: String,
    pub label: &'static str,
    pub selected: bool,
}

/// Create/update form template.
#[derive(Template, WebTemplate)]
#[template(path = "events/form.html")]
pub struct FormTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryLink>,
    pub heading: String,
    pub action_url: String,
    /// Set when editing; enables the cancel and reopen buttons.
    pub editing: Option<EditingInfo>,
    pub input: EventInput,
    pub category_options: Vec<CategoryOption>,
    pub errors: ValidationErrors,
}

/// What the update form shows about the stored event.
#[derive(Debug, Clone)]
pub struct EditingInfo {
    pub id: i32,
    pub status: String,
    pub image: String,
    pub is_cancelled: bool,
}

impl FormTemplate {
    fn new(page: PageContext, input: EventInput, errors: ValidationErrors) -> Self {
        let category_options = EventCategory::ALL
            .iter()
            .map(|c| CategoryOption {
                value: c.to_string(),
                label: c.label(),
                selected: input.category.eq_ignore_ascii_case(&c.to_string()),
            })
            .collect();

        Self {
            page,
            categories: CategoryLink::all(None),
            heading: "Create a Food and Drink Festival Event".to_string(),
            action_url: "/events/create".to_string(),
            editing: None,
            input,
            category_options,
            errors,
        }
    }

    fn editing(mut self, info: EditingInfo) -> Self {
        self.heading = "Update Event".to_string();
        self.action_url = format!("/events/{}/update", info.id);
        self.editing = Some(info);
        self
    }
}

// =============================================================================
// Detail
// =============================================================================

/// Event detail with comments and the purchase form.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = EventId::new(id);
    refresh_statuses(state.pool()).await;

    let event = EventRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event {id}")))?;
    let comments = CommentRepository::new(state.pool())
        .list_for_event(id)
        .await?;

    let offset = state.config().utc_offset;
    let is_creator = page
        .current_user
        .as_ref()
        .is_some_and(|u| event.is_created_by(u.id));

    Ok(ShowTemplate {
        page,
        categories: CategoryLink::all(Some(event.category)),
        event: EventView::new(&event, offset, is_creator),
        comments: comments
            .iter()
            .map(|c| CommentView::new(c, offset))
            .collect(),
    })
}

// =============================================================================
// Create
// =============================================================================

/// Display the create form.
pub async fn create_page(RequireAuth(_user): RequireAuth, page: PageContext) -> impl IntoResponse {
    FormTemplate::new(page, EventInput::default(), ValidationErrors::new())
}

/// Handle the create form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    page: PageContext,
    multipart: Multipart,
) -> Result<Response> {
    let form = EventForm::read(multipart).await?;
    let config = state.config();

    let result = EventService::new(state.pool(), &config.upload_dir)
        .create(
            user.id,
            &form.input,
            form.image.as_ref(),
            Utc::now(),
            config.utc_offset,
        )
        .await;

    match result {
        Ok((id, title)) => {
            let event_id = id.to_string();
            add_breadcrumb("events", "Created event", Some(&[("event_id", event_id.as_str())]));
            Ok(flash_redirect(
                &session,
                FlashLevel::Success,
                format!("Successfully created new Food and Drink Festival event titled: {title}"),
                "/",
            )
            .await)
        }
        Err(EventError::Validation(errors)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            FormTemplate::new(page, form.input, errors),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Update
// =============================================================================

/// Display the update form, pre-filled from the stored event.
#[instrument(skip(state, session, page, user), fields(user_id = %user.id))]
pub async fn update_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    page: PageContext,
    Path(id): Path<i32>,
) -> Result<Response> {
    let id = EventId::new(id);
    refresh_statuses(state.pool()).await;

    let event = EventRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event {id}")))?;

    if !event.is_created_by(user.id) {
        return Ok(not_creator(&session, id).await);
    }

    let info = EditingInfo {
        id: id.as_i32(),
        status: event.status.to_string(),
        image: event.image.clone(),
        is_cancelled: event.status == foodievent_core::EventStatus::Cancelled,
    };
    let input = event_input(&event, state.config().utc_offset);

    Ok(FormTemplate::new(page, input, ValidationErrors::new())
        .editing(info)
        .into_response())
}

/// Handle the update form, including cancel and reopen.
#[instrument(skip(state, session, page, multipart, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    page: PageContext,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response> {
    let id = EventId::new(id);
    let form = EventForm::read(multipart).await?;
    let config = state.config();

    let result = EventService::new(state.pool(), &config.upload_dir)
        .update(
            id,
            user.id,
            &form.input,
            form.image.as_ref(),
            form.action,
            Utc::now(),
            config.utc_offset,
        )
        .await;

    match result {
        Ok(update) => {
            let event_id = id.to_string();
            add_breadcrumb("events", "Updated event", Some(&[("event_id", event_id.as_str())]));
            Ok(flash_redirect(
                &session,
                FlashLevel::Success,
                update.message(),
                &format!("/events/{id}"),
            )
            .await)
        }
        Err(EventError::Forbidden) => Ok(not_creator(&session, id).await),
        Err(EventError::Validation(errors)) => {
            // Re-read the stored event for the status and image shown beside the form
            let event = EventRepository::new(state.pool())
                .get_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("event {id}")))?;
            let info = EditingInfo {
                id: id.as_i32(),
                status: event.status.to_string(),
                image: event.image,
                is_cancelled: event.status == foodievent_core::EventStatus::Cancelled,
            };
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                FormTemplate::new(page, form.input, errors).editing(info),
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn not_creator(session: &Session, id: EventId) -> Response {
    flash_redirect(
        session,
        FlashLevel::Warning,
        "Only the creator of this event can update it.",
        &format!("/events/{id}"),
    )
    .await
}

// =============================================================================
// Comments
// =============================================================================

/// Post a comment.
#[instrument(skip(state, session, form, user), fields(user_id = %user.id))]
pub async fn comment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    let id = EventId::new(id);
    let to = format!("/events/{id}#comments");
    let config = state.config();

    let result = EventService::new(state.pool(), &config.upload_dir)
        .comment(id, user.id, &form.contents, Utc::now())
        .await;

    match result {
        Ok(comment_id) => Ok(flash_redirect(
            &session,
            FlashLevel::Success,
            format!("Your comment has been posted. It is comment #{comment_id} on FoodieVent."),
            &to,
        )
        .await),
        Err(EventError::Validation(_)) => Ok(flash_redirect(
            &session,
            FlashLevel::Danger,
            "Your comment was unable to be posted, please ensure you enter a valid comment.",
            &to,
        )
        .await),
        Err(EventError::NotFound) => Err(AppError::NotFound(format!("event {id}"))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_template_selects_category() {
        let input = EventInput {
            category: "DRINK".to_string(),
            ..EventInput::default()
        };
        let template = FormTemplate::new(PageContext::default(), input, ValidationErrors::new());
        let selected: Vec<_> = template
            .category_options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.label)
            .collect();
        assert_eq!(selected, vec!["Drink"]);
        assert!(template.editing.is_none());
    }

    #[test]
    fn test_editing_sets_action_url() {
        let template = FormTemplate::new(
            PageContext::default(),
            EventInput::default(),
            ValidationErrors::new(),
        )
        .editing(EditingInfo {
            id: 9,
            status: "CANCELLED".to_string(),
            image: "/static/img/a.jpg".to_string(),
            is_cancelled: true,
        });
        assert_eq!(template.action_url, "/events/9/update");
        assert_eq!(template.heading, "Update Event");
    }

    #[test]
    fn test_form_renders_field_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("venue", "Please enter the venue name and city");
        errors.add("image", "Please upload a PNG or JPG image");

        let html = FormTemplate::new(PageContext::default(), EventInput::default(), errors)
            .editing(EditingInfo {
                id: 4,
                status: "CANCELLED".to_string(),
                image: "/static/img/a.jpg".to_string(),
                is_cancelled: true,
            })
            .render()
            .unwrap();

        assert!(html.contains(r#"<p class="field-error">Please enter the venue name and city</p>"#));
        assert!(html.contains(r#"<p class="field-error">Please upload a PNG or JPG image</p>"#));
        assert!(html.contains(r#"action="/events/4/update""#));
        assert!(html.contains(r#"value="reopen""#));
    }
}
