//! Comment repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use foodievent_core::{CommentId, EventId, UserId};

use super::RepositoryError;
use crate::models::Comment;

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: CommentId,
    event_id: EventId,
    user_id: UserId,
    author: String,
    contents: String,
    comment_date: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            author: row.author,
            contents: row.contents,
            comment_date: row.comment_date,
        }
    }
}

/// Repository for comment database operations.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Comments on an event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_event(&self, event: EventId) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT c.id, c.event_id, c.user_id,
                   u.first_name || ' ' || u.surname AS author,
                   c.contents, c.comment_date
            FROM foodievent.comments c
            JOIN foodievent.users u ON u.id = c.user_id
            WHERE c.event_id = $1
            ORDER BY c.comment_date, c.id
            ",
        )
        .bind(event)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    /// Post a comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the event does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        event: EventId,
        user: UserId,
        contents: &str,
        now: DateTime<Utc>,
    ) -> Result<CommentId, RepositoryError> {
        let id: Option<CommentId> = sqlx::query_scalar(
            r"
            INSERT INTO foodievent.comments (contents, comment_date, user_id, event_id)
            SELECT $1, $2, $3, e.id FROM foodievent.events e WHERE e.id = $4
            RETURNING id
            ",
        )
        .bind(contents)
        .bind(now)
        .bind(user)
        .bind(event)
        .fetch_optional(self.pool)
        .await?;

        id.ok_or(RepositoryError::NotFound)
    }
}
