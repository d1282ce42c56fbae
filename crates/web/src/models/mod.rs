//! Domain models for FoodieVent.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod comment;
pub mod event;
pub mod order;
pub mod session;
pub mod user;

pub use comment::Comment;
pub use event::Event;
pub use order::{Booking, Order};
pub use session::{CurrentUser, Flash, FlashLevel, keys as session_keys};
pub use user::User;
