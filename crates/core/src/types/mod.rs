//! Core types for the crypto shopping cart.
//!
//! Type-safe wrappers for identifiers, currency codes and email addresses.

pub mod currency;
pub mod email;
pub mod id;

pub use currency::{Currency, CurrencyError, format_amount};
pub use email::{Email, EmailError};
pub use id::*;
