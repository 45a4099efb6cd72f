//! Crypto Cart Core - domain types and the cart engine.
//!
//! This crate is shared by the storefront binary and the CLI:
//! - `storefront` - Public shop with session carts and email checkout
//! - `cli` - Migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. Every cart mutation takes a [`Cart`] and
//! returns a new one, so callers decide when (and whether) to persist it.
//!
//! # Modules
//!
//! - [`types`] - Currencies, amounts, entity IDs, email addresses
//! - [`catalog`] - Products, price tiers and wallets
//! - [`cart`] - Line items, totals and the cart operations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod types;

pub use cart::{
    Cart, CartError, CartItem, Totals, add_to_cart, empty_cart, remove_from_cart, set_currency,
};
pub use catalog::{PriceTier, Product, Wallet, unit_prices};
pub use types::*;
