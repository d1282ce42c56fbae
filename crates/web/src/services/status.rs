//! Status engine scheduling.
//!
//! Statuses are refreshed eagerly before pages that show them, and by a
//! background task so rows are fresh even when nobody is browsing.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use foodievent_core::lifecycle::RefreshReport;

use crate::db::{RepositoryError, StatusRepository};

/// Run one status pass as of now.
///
/// # Errors
///
/// Returns `RepositoryError` if the pass could not be stored.
pub async fn refresh_now(pool: &PgPool) -> Result<RefreshReport, RepositoryError> {
    StatusRepository::new(pool).refresh_all(Utc::now()).await
}

/// Spawn the background refresher.
///
/// Failures are logged and the loop keeps going; the next tick retries.
#[must_use]
pub fn spawn_refresher(pool: PgPool, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_secs = every.as_secs(), "Status refresher started");

        loop {
            interval.tick().await;
            match refresh_now(&pool).await {
                Ok(report) if !report.is_empty() => tracing::info!(
                    events = report.events_changed.len(),
                    tickets = report.tickets_changed.len(),
                    "Scheduled status pass changed rows"
                ),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Scheduled status pass failed"),
            }
        }
    })
}
