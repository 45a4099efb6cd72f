//! Catalog records: products, their price tiers and payment wallets.
//!
//! A product is not priced in a currency directly. Each [`PriceTier`] points at
//! a [`Wallet`], and the wallet decides which currency that price is in. This
//! lets one product be sold for, say, `10 CAD` via e-transfer and `0.0002 BTC`
//! on-chain at the same time.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Currency, ProductId, WalletId};

/// A payment destination for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub currency: Currency,
    /// Address (or e-transfer email) encoded into the checkout QR code.
    pub address: String,
    /// Human label, e.g. "Bitcoin" or "Interac e-Transfer".
    pub display_name: String,
}

/// One price of a product, payable to a specific wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub price: Decimal,
    pub wallet_id: WalletId,
}

/// A product as listed in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// URL slug used by `/product/{friendly_link}`.
    pub friendly_link: String,
    pub description: String,
    /// File name under `static/images/products/`.
    pub image: String,
    pub prices: Vec<PriceTier>,
    /// Variants such as sizes. When non-empty, one must be chosen.
    #[serde(default)]
    pub options: Vec<String>,
}

impl Product {
    #[must_use]
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    #[must_use]
    pub fn offers_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// Resolve a product's price tiers into a per-currency unit price map.
///
/// Tiers whose wallet is not in `wallets` are skipped. If two tiers land in
/// the same currency the first one listed wins.
#[must_use]
pub fn unit_prices(product: &Product, wallets: &[Wallet]) -> BTreeMap<Currency, Decimal> {
    let mut prices = BTreeMap::new();
    for tier in &product.prices {
        let Some(wallet) = wallets.iter().find(|w| w.id == tier.wallet_id) else {
            continue;
        };
        prices
            .entry(wallet.currency.clone())
            .or_insert(tier.price);
    }
    prices
}
