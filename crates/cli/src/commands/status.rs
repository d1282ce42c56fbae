//! One-shot status pass.
//!
//! The web server runs the same pass on a timer; this command is for cron
//! jobs, deploys with the refresher disabled, and checking what a pass at a
//! future instant would do.

use chrono::{DateTime, Utc};
use foodievent_web::db::StatusRepository;

use super::{CommandError, connect};

/// Run a status pass as of `at`.
///
/// With `dry_run` the changes are only reported, never stored.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or the pass fails.
pub async fn refresh(at: DateTime<Utc>, dry_run: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let repo = StatusRepository::new(&pool);

    let report = if dry_run {
        repo.preview(at).await?
    } else {
        repo.refresh_all(at).await?
    };

    for id in &report.events_changed {
        tracing::info!(event_id = %id, dry_run, "Event status changed");
    }
    for id in &report.tickets_changed {
        tracing::info!(order_id = %id, dry_run, "Ticket status changed");
    }

    tracing::info!(
        at = %at,
        events = report.events_changed.len(),
        tickets = report.tickets_changed.len(),
        dry_run,
        "Status pass complete"
    );
    Ok(())
}
