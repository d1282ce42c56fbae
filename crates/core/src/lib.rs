//! FoodieVent Core - Domain types and rules.
//!
//! This crate holds everything about FoodieVent that can be decided without
//! touching a database or an HTTP request:
//!
//! - [`types`] - Newtype IDs, email, prices, and the status / category enums
//! - [`lifecycle`] - The status engine deriving event and ticket states from time and inventory
//! - [`ledger`] - Ticket inventory arithmetic for purchases, cancellations and reopening
//! - [`validation`] - Field validators gating registration, events, comments and purchases
//!
//! # Architecture
//!
//! The core crate performs no I/O. Callers pass the current time in explicitly,
//! which keeps every rule deterministic and testable. The `postgres` feature adds
//! `sqlx` type mappings so the web crate can bind these types directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ledger;
pub mod lifecycle;
pub mod types;
pub mod validation;

pub use ledger::LedgerError;
pub use types::*;
pub use validation::{FieldError, ValidationErrors};
