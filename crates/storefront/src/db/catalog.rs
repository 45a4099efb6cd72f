//! `PostgreSQL` catalog repository.
//!
//! Products are stored across three tables (product, ordered prices, ordered
//! options), so every read loads the product rows first and then fetches the
//! child rows for all of them in one query each.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use crypto_cart_core::{Currency, PriceTier, Product, ProductId, Wallet, WalletId};

use super::{CatalogStore, RepositoryError};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    friendly_link: String,
    description: String,
    image: String,
}

#[derive(sqlx::FromRow)]
struct PriceRow {
    product_id: ProductId,
    wallet_id: WalletId,
    price: Decimal,
}

#[derive(sqlx::FromRow)]
struct OptionRow {
    product_id: ProductId,
    name: String,
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: WalletId,
    currency: String,
    address: String,
    display_name: String,
}

/// Catalog backed by the `shop` schema.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach prices and options to product rows, preserving row order.
    async fn hydrate(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id.get()).collect();

        let prices: Vec<PriceRow> = sqlx::query_as(
            r"
            SELECT product_id, wallet_id, price
            FROM shop.product_price
            WHERE product_id = ANY($1)
            ORDER BY product_id, position
            ",
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let options: Vec<OptionRow> = sqlx::query_as(
            r"
            SELECT product_id, name
            FROM shop.product_option
            WHERE product_id = ANY($1)
            ORDER BY product_id, position
            ",
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut prices_by_product: HashMap<ProductId, Vec<PriceTier>> = HashMap::new();
        for row in prices {
            prices_by_product
                .entry(row.product_id)
                .or_default()
                .push(PriceTier {
                    price: row.price,
                    wallet_id: row.wallet_id,
                });
        }

        let mut options_by_product: HashMap<ProductId, Vec<String>> = HashMap::new();
        for row in options {
            options_by_product
                .entry(row.product_id)
                .or_default()
                .push(row.name);
        }

        Ok(rows
            .into_iter()
            .map(|r| Product {
                prices: prices_by_product.remove(&r.id).unwrap_or_default(),
                options: options_by_product.remove(&r.id).unwrap_or_default(),
                id: r.id,
                name: r.name,
                friendly_link: r.friendly_link,
                description: r.description,
                image: r.image,
            })
            .collect())
    }

    async fn first(&self, rows: Vec<ProductRow>) -> Result<Option<Product>, RepositoryError> {
        Ok(self.hydrate(rows).await?.into_iter().next())
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r"
            SELECT id, name, friendly_link, description, image
            FROM shop.product
            ORDER BY created_at, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    #[instrument(skip(self))]
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r"
            SELECT id, name, friendly_link, description, image
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        self.first(rows).await
    }

    #[instrument(skip(self))]
    async fn product_by_link(
        &self,
        friendly_link: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r"
            SELECT id, name, friendly_link, description, image
            FROM shop.product
            WHERE friendly_link = $1
            ",
        )
        .bind(friendly_link)
        .fetch_all(&self.pool)
        .await?;

        self.first(rows).await
    }

    #[instrument(skip(self))]
    async fn wallets(&self) -> Result<Vec<Wallet>, RepositoryError> {
        let rows: Vec<WalletRow> = sqlx::query_as(
            r"
            SELECT id, currency, address, display_name
            FROM shop.wallet
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let currency = Currency::parse(&r.currency).map_err(|e| {
                    RepositoryError::DataCorruption(format!(
                        "invalid currency on wallet {}: {e}",
                        r.id
                    ))
                })?;
                Ok(Wallet {
                    id: r.id,
                    currency,
                    address: r.address,
                    display_name: r.display_name,
                })
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
