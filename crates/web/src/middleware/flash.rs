//! One-shot flash messages and the per-page context.
//!
//! Handlers push a [`Flash`] before redirecting; the next rendered page takes
//! every pending flash out of the session via [`PageContext`].

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{CurrentUser, Flash, FlashLevel, session_keys};

/// Queue a flash message for the next page.
///
/// A session failure only loses the message, so it is logged, not returned.
pub async fn push_flash(session: &Session, level: FlashLevel, message: impl Into<String>) {
    let mut flashes: Vec<Flash> = session
        .get(session_keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    flashes.push(Flash {
        level,
        message: message.into(),
    });

    if let Err(e) = session.insert(session_keys::FLASHES, flashes).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Remove and return every pending flash message.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(session_keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// What every page's layout needs: who is logged in and what to announce.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Display name of the logged-in user.
    #[must_use]
    pub fn user_name(&self) -> Option<String> {
        self.current_user.as_ref().map(CurrentUser::full_name)
    }

    /// Add a message shown on this page only.
    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        Ok(Self {
            current_user: super::auth::current_user(session).await,
            flashes: take_flashes(session).await,
        })
    }
}
