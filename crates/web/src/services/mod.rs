//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login (argon2)
//! - `events` - Event create/update, cancel/reopen, comments
//! - `tickets` - Ticket purchase and order cancellation
//! - `status` - Status engine passes, eager and scheduled
//! - `uploads` - Event image storage
//!
//! Services own their transactions: every ledger transition is planned by
//! [`foodievent_core::ledger`] and applied inside one sqlx transaction, which
//! is rolled back on drop if any step fails.

pub mod auth;
pub mod events;
pub mod status;
pub mod tickets;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use events::{EventAction, EventError, EventService, EventUpdate, LifecycleChange};
pub use tickets::{OrderCancellation, Purchase, TicketError, TicketService};
pub use uploads::{ImageUpload, UploadError};
