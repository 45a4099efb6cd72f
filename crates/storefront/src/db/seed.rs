//! Catalog seeding from a declarative file.
//!
//! The CLI reads a YAML document of this shape and inserts it:
//!
//! ```yaml
//! wallets:
//!   - key: etransfer
//!     currency: CAD
//!     address: pay@example.ca
//!     display_name: Interac e-Transfer
//! products:
//!   - name: Logo Tee
//!     friendly_link: logo-tee
//!     image: logo-tee.jpg
//!     options: [S, M, L]
//!     prices:
//!       - wallet: etransfer
//!         price: "25.00"
//! ```
//!
//! Wallets are upserted on `(currency, address)`. Products whose
//! `friendly_link` already exists are left alone and counted as skipped.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use crypto_cart_core::Currency;

use super::RepositoryError;

/// Root of a catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub wallets: Vec<WalletEntry>,
    #[serde(default)]
    pub products: Vec<ProductEntry>,
}

/// A wallet, referenced from prices by `key`.
#[derive(Debug, Deserialize)]
pub struct WalletEntry {
    pub key: String,
    pub currency: Currency,
    pub address: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductEntry {
    pub name: String,
    pub friendly_link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub prices: Vec<PriceEntry>,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceEntry {
    /// `key` of a wallet in the same file.
    pub wallet: String,
    pub price: Decimal,
}

/// Outcome of a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub wallets: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Check a catalog file for problems the database would not catch nicely.
///
/// Returns one message per problem; an empty list means the file is usable.
#[must_use]
pub fn validate_catalog(file: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut wallet_keys = HashSet::new();
    for wallet in &file.wallets {
        if !wallet_keys.insert(wallet.key.as_str()) {
            errors.push(format!("wallet key '{}' is defined twice", wallet.key));
        }
        if wallet.address.trim().is_empty() {
            errors.push(format!("wallet '{}' has an empty address", wallet.key));
        }
    }

    let mut links = HashSet::new();
    for product in &file.products {
        let link = product.friendly_link.as_str();
        if link.is_empty() || !link.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            errors.push(format!(
                "product '{}' has an invalid friendly_link '{link}'",
                product.name
            ));
        }
        if !links.insert(link) {
            errors.push(format!("friendly_link '{link}' is used twice"));
        }
        if product.prices.is_empty() {
            errors.push(format!("product '{link}' has no prices"));
        }
        for price in &product.prices {
            if !wallet_keys.contains(price.wallet.as_str()) {
                errors.push(format!(
                    "product '{link}' references unknown wallet '{}'",
                    price.wallet
                ));
            }
            if price.price.is_sign_negative() {
                errors.push(format!("product '{link}' has a negative price"));
            }
        }
        let mut options = HashSet::new();
        for option in &product.options {
            if option.trim().is_empty() || !options.insert(option.as_str()) {
                errors.push(format!(
                    "product '{link}' has an empty or duplicate option '{option}'"
                ));
            }
        }
    }

    errors
}

/// Insert a validated catalog file in a single transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any statement fails (nothing is
/// committed), or `RepositoryError::DataCorruption` if a price references a
/// wallet key missing from the file.
#[instrument(skip_all, fields(wallets = file.wallets.len(), products = file.products.len()))]
pub async fn seed_catalog(pool: &PgPool, file: &CatalogFile) -> Result<SeedReport, RepositoryError> {
    let mut tx = pool.begin().await?;
    let mut report = SeedReport::default();

    let mut wallet_ids: HashMap<&str, i32> = HashMap::new();
    for wallet in &file.wallets {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.wallet (currency, address, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (currency, address)
            DO UPDATE SET display_name = EXCLUDED.display_name
            RETURNING id
            ",
        )
        .bind(wallet.currency.code())
        .bind(&wallet.address)
        .bind(&wallet.display_name)
        .fetch_one(&mut *tx)
        .await?;
        wallet_ids.insert(wallet.key.as_str(), id);
        report.wallets += 1;
    }

    for product in &file.products {
        let inserted: Option<i32> = sqlx::query_scalar(
            r"
            INSERT INTO shop.product (name, friendly_link, description, image)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (friendly_link) DO NOTHING
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.friendly_link)
        .bind(&product.description)
        .bind(&product.image)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(product_id) = inserted else {
            info!(friendly_link = %product.friendly_link, "Product exists, skipping");
            report.skipped += 1;
            continue;
        };

        for (position, price) in (0_i32..).zip(&product.prices) {
            let wallet_id = wallet_ids.get(price.wallet.as_str()).ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "unknown wallet '{}' for product '{}'",
                    price.wallet, product.friendly_link
                ))
            })?;
            sqlx::query(
                r"
                INSERT INTO shop.product_price (product_id, position, wallet_id, price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(product_id)
            .bind(position)
            .bind(wallet_id)
            .bind(price.price)
            .execute(&mut *tx)
            .await?;
        }

        for (position, option) in (0_i32..).zip(&product.options) {
            sqlx::query(
                r"
                INSERT INTO shop.product_option (product_id, position, name)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(product_id)
            .bind(position)
            .bind(option)
            .execute(&mut *tx)
            .await?;
        }

        report.inserted += 1;
    }

    tx.commit().await?;
    Ok(report)
}
