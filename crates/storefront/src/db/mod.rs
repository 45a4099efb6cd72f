//! Catalog storage for the storefront.
//!
//! # Database: `PostgreSQL`, schema `shop`
//!
//! ## Tables
//!
//! - `shop.wallet` - Payment destinations, one currency each
//! - `shop.product` - Products, addressed by `friendly_link`
//! - `shop.product_price` - Ordered price tiers (price + wallet) per product
//! - `shop.product_option` - Ordered variant names per product
//! - `tower_sessions.session` - Tower-sessions storage (carts live here)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p crypto-cart-cli -- migrate
//! ```

pub mod catalog;
pub mod memory;
pub mod seed;

use std::time::Duration;

use async_trait::async_trait;
use crypto_cart_core::{Product, ProductId, Wallet};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::PgCatalog;
pub use memory::MemoryCatalog;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The store cannot be reached.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read access to products and wallets.
///
/// Handlers only see this trait; production uses [`PgCatalog`], tests and
/// demos use [`MemoryCatalog`].
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products, oldest first.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn product_by_link(&self, friendly_link: &str)
    -> Result<Option<Product>, RepositoryError>;

    /// All wallets, in creation order.
    async fn wallets(&self) -> Result<Vec<Wallet>, RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
