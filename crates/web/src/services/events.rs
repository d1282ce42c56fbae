//! Event creation, editing and the creator's lifecycle actions.

use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::instrument;

use foodievent_core::ledger::{self, CancellationSummary, LedgerError};
use foodievent_core::validation::{EventDraft, EventInput, comment_contents};
use foodievent_core::{CommentId, EventId, EventStatus, UserId, ValidationErrors};

use super::uploads::{self, ImageUpload, UploadError};
use crate::db::events::LockedEvent;
use crate::db::{CommentRepository, EventRepository, OrderRepository, RepositoryError};

/// Shown when another event already has the title.
pub const TITLE_TAKEN: &str =
    "An event with this title already exists. Please choose a different title.";

/// Shown when a new event has no image.
pub const IMAGE_REQUIRED: &str = "Please upload a Destination Image";

/// Errors from event operations.
#[derive(Debug, Error)]
pub enum EventError {
    /// The form failed validation; re-render it with these messages.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("not found")]
    NotFound,

    /// Only the creator may change an event.
    #[error("Only the creator of this event can update it.")]
    Forbidden,

    /// The image could not be stored.
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for EventError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(_) => {
                Self::Validation(ValidationErrors::single("title", TITLE_TAKEN))
            }
            other => Self::Repository(other),
        }
    }
}

impl From<sqlx::Error> for EventError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// What the creator asked for along with the field edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventAction {
    /// Only save the fields.
    #[default]
    Save,
    /// Save, then cancel the event and refund active orders.
    Cancel,
    /// Save, then re-open a cancelled event.
    Reopen,
}

impl EventAction {
    /// Read the submit button's value.
    #[must_use]
    pub fn from_form(value: Option<&str>) -> Self {
        match value {
            Some("cancel") => Self::Cancel,
            Some("reopen") => Self::Reopen,
            _ => Self::Save,
        }
    }
}

/// What an update did beyond saving the fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleChange {
    None,
    Cancelled(CancellationSummary),
    AlreadyCancelled,
    Reopened,
    /// Reopen was asked for an event that was not cancelled.
    NotReopened(EventStatus),
}

/// Result of [`EventService::update`].
#[derive(Debug, Clone)]
pub struct EventUpdate {
    pub id: EventId,
    pub title: String,
    pub change: LifecycleChange,
}

impl EventUpdate {
    /// Flash text shown to the creator.
    #[must_use]
    pub fn message(&self) -> String {
        let saved = format!("Successfully updated event titled: {}.", self.title);
        match &self.change {
            LifecycleChange::None => saved,
            LifecycleChange::Cancelled(summary) => {
                format!("{saved} {}", summary.message(&self.title))
            }
            LifecycleChange::AlreadyCancelled => {
                format!("{saved} {} was already cancelled.", self.title)
            }
            LifecycleChange::Reopened => format!("{saved} {} has been re-opened.", self.title),
            LifecycleChange::NotReopened(status) => format!(
                "{saved} {} was not re-opened because it is {status}, not CANCELLED.",
                self.title
            ),
        }
    }
}

/// Event service.
pub struct EventService<'a> {
    pool: &'a PgPool,
    upload_dir: &'a Path,
}

impl<'a> EventService<'a> {
    /// Create a new event service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, upload_dir: &'a Path) -> Self {
        Self { pool, upload_dir }
    }

    /// Validate the form, store the image and insert an `OPEN` event.
    ///
    /// The image is removed again if the insert fails.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Validation` with every failing field, including a
    /// taken title and a missing or badly named image.
    #[instrument(skip_all, fields(creator = %creator))]
    pub async fn create(
        &self,
        creator: UserId,
        input: &EventInput,
        image: Option<&ImageUpload>,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<(EventId, String), EventError> {
        let mut tx = self.pool.begin().await?;

        let mut errors = ValidationErrors::new();
        let draft = validate(&mut tx, input, None, now, offset, &mut errors).await?;

        match image {
            None => errors.add("image", IMAGE_REQUIRED),
            Some(upload) => {
                if let Err(UploadError::Rejected(message)) = upload.stored_name() {
                    errors.add("image", message);
                }
            }
        }

        let (Some(draft), Some(image)) = (draft, image) else {
            return Err(EventError::Validation(errors));
        };
        errors.into_result(())?;

        let image_path = uploads::save_image(self.upload_dir, image).await?;
        let inserted = async {
            let id = EventRepository::create(&mut tx, &draft, &image_path, creator, now).await?;
            tx.commit().await?;
            Ok::<_, EventError>(id)
        }
        .await;

        let id = match inserted {
            Ok(id) => id,
            Err(e) => {
                uploads::remove_image(self.upload_dir, &image_path).await;
                return Err(e);
            }
        };

        tracing::info!(event_id = %id, title = %draft.title, "Event created");
        Ok((id, draft.title))
    }

    /// Save the creator's edits, then apply `action`.
    ///
    /// Everything happens in one transaction with the event and its orders
    /// locked. The ticket count from the form becomes the new remaining
    /// inventory; a cancellation then adds the refunded tickets on top. A
    /// new image is removed again if the transaction does not commit.
    ///
    /// # Errors
    ///
    /// Returns `EventError::NotFound`, `EventError::Forbidden` for anyone but
    /// the creator, or `EventError::Validation` for bad fields.
    #[instrument(skip(self, input, image), fields(editor = %editor, event = %id))]
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: EventId,
        editor: UserId,
        input: &EventInput,
        image: Option<&ImageUpload>,
        action: EventAction,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<EventUpdate, EventError> {
        let mut tx = self.pool.begin().await?;

        let locked = EventRepository::lock(&mut tx, id).await?;
        if locked.creator_id != editor {
            tracing::warn!("Attempt to update another user's event");
            return Err(EventError::Forbidden);
        }

        let mut errors = ValidationErrors::new();
        let draft = validate(&mut tx, input, Some(id), now, offset, &mut errors).await?;
        if let Some(upload) = image
            && let Err(UploadError::Rejected(message)) = upload.stored_name()
        {
            errors.add("image", message);
        }
        let Some(draft) = draft else {
            return Err(EventError::Validation(errors));
        };
        errors.into_result(())?;

        let image_path = match image {
            Some(upload) => Some(uploads::save_image(self.upload_dir, upload).await?),
            None => None,
        };

        let applied = async {
            EventRepository::update_details(&mut tx, id, &draft, image_path.as_deref()).await?;
            let change = apply_action(&mut tx, &locked, action, now).await?;
            tx.commit().await?;
            Ok::<_, EventError>(change)
        }
        .await;

        let change = match applied {
            Ok(change) => change,
            Err(e) => {
                if let Some(path) = &image_path {
                    uploads::remove_image(self.upload_dir, path).await;
                }
                return Err(e);
            }
        };

        match &change {
            LifecycleChange::Cancelled(summary) => tracing::info!(
                tickets = summary.tickets_to_return,
                refund = %summary.total_refund,
                orders = summary.order_ids.len(),
                "Event cancelled"
            ),
            LifecycleChange::Reopened => tracing::info!("Event re-opened"),
            _ => tracing::info!("Event updated"),
        }

        Ok(EventUpdate {
            id,
            title: draft.title,
            change,
        })
    }

    /// Post a comment on `event`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Validation` for empty contents and
    /// `EventError::NotFound` if the event does not exist.
    #[instrument(skip(self, contents), fields(author = %author, event = %event))]
    pub async fn comment(
        &self,
        event: EventId,
        author: UserId,
        contents: &str,
        now: DateTime<Utc>,
    ) -> Result<CommentId, EventError> {
        let contents = comment_contents(contents)
            .map_err(|message| ValidationErrors::single("contents", message))?;

        let id = CommentRepository::new(self.pool)
            .create(event, author, &contents, now)
            .await?;

        tracing::info!(comment_id = %id, "Comment posted");
        Ok(id)
    }
}

/// Run the creator's lifecycle action against the locked event.
async fn apply_action(
    conn: &mut PgConnection,
    locked: &LockedEvent,
    action: EventAction,
    now: DateTime<Utc>,
) -> Result<LifecycleChange, EventError> {
    let id = locked.id;
    let change = match action {
        EventAction::Save => LifecycleChange::None,
        EventAction::Cancel => {
            let lines = OrderRepository::lock_lines_for_event(conn, id).await?;
            match ledger::plan_event_cancellation(locked.status, &lines) {
                Some(summary) => {
                    EventRepository::restock(conn, id, summary.tickets_to_return).await?;
                    OrderRepository::cancel(conn, &summary.order_ids).await?;
                    EventRepository::set_status(conn, id, EventStatus::Cancelled, now).await?;
                    LifecycleChange::Cancelled(summary)
                }
                None => LifecycleChange::AlreadyCancelled,
            }
        }
        EventAction::Reopen => match ledger::reopen(locked.status) {
            Ok(status) => {
                EventRepository::set_status(conn, id, status, now).await?;
                LifecycleChange::Reopened
            }
            Err(LedgerError::NotCancelled(status)) => LifecycleChange::NotReopened(status),
            Err(other) => {
                tracing::warn!(error = %other, "Unexpected reopen refusal");
                LifecycleChange::NotReopened(locked.status)
            }
        },
    };
    Ok(change)
}

/// Field validation plus the title uniqueness check, on the caller's
/// transaction.
async fn validate(
    conn: &mut PgConnection,
    input: &EventInput,
    except: Option<EventId>,
    now: DateTime<Utc>,
    offset: FixedOffset,
    errors: &mut ValidationErrors,
) -> Result<Option<EventDraft>, EventError> {
    let draft = match input.validate(now, offset) {
        Ok(draft) => Some(draft),
        Err(e) => {
            errors.merge(e);
            None
        }
    };

    let title = input.title.trim();
    if !title.is_empty()
        && !errors.has("title")
        && EventRepository::title_taken(conn, title, except).await?
    {
        errors.add("title", TITLE_TAKEN);
    }

    Ok(draft)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodievent_core::{OrderId, Price};

    fn update(change: LifecycleChange) -> EventUpdate {
        EventUpdate {
            id: EventId::new(3),
            title: "Taco Night".to_string(),
            change,
        }
    }

    #[test]
    fn test_action_from_form() {
        assert_eq!(EventAction::from_form(None), EventAction::Save);
        assert_eq!(EventAction::from_form(Some("save")), EventAction::Save);
        assert_eq!(EventAction::from_form(Some("cancel")), EventAction::Cancel);
        assert_eq!(EventAction::from_form(Some("reopen")), EventAction::Reopen);
    }

    #[test]
    fn test_update_messages() {
        assert_eq!(
            update(LifecycleChange::None).message(),
            "Successfully updated event titled: Taco Night."
        );

        let summary = CancellationSummary {
            tickets_to_return: 8,
            total_refund: Price::parse("80").unwrap(),
            order_ids: vec![OrderId::new(1), OrderId::new(2)],
        };
        assert_eq!(
            update(LifecycleChange::Cancelled(summary)).message(),
            "Successfully updated event titled: Taco Night. Taco Night has been cancelled. \
             8 tickets have been refunded and resupplied. Total amount refunded: $80.00"
        );

        assert!(
            update(LifecycleChange::Reopened)
                .message()
                .ends_with("Taco Night has been re-opened.")
        );
        assert!(
            update(LifecycleChange::NotReopened(EventStatus::Open))
                .message()
                .contains("was not re-opened because it is OPEN")
        );
    }

    #[test]
    fn test_conflict_becomes_title_error() {
        let err = EventError::from(RepositoryError::Conflict("event title already exists".into()));
        match err {
            EventError::Validation(errors) => assert_eq!(errors.first("title"), Some(TITLE_TAKEN)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
