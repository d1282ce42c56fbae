//! Comment domain types.

use chrono::{DateTime, Utc};

use foodievent_core::{CommentId, EventId, UserId};

/// A comment on an event, with its author's name.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: CommentId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub author: String,
    pub contents: String,
    pub comment_date: DateTime<Utc>,
}
