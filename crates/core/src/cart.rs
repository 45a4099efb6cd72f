//! Session cart engine.
//!
//! A [`Cart`] is a plain value. Every operation here borrows the current cart
//! and returns the next one; nothing is mutated in place, so a handler that
//! hits an error can simply keep (and not persist) the cart it started with.
//!
//! Line items are keyed by `(product_id, option)`. Two sizes of the same
//! shirt are two lines; adding the same size twice bumps the quantity.
//!
//! Totals are kept per currency and rebuilt from the line items after every
//! operation, including when a cart is read back from the session store.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, Wallet, unit_prices};
use crate::types::{Currency, ProductId, format_amount};

/// Reasons a cart operation is refused. The input cart is left as it was.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("product not found")]
    ProductNotFound,
    #[error("{product} comes in several options, please choose one")]
    OptionRequired { product: String },
    #[error("{product} is not available as {option:?}")]
    UnknownOption { product: String, option: String },
    #[error("no wallet accepts {0}")]
    UnsupportedCurrency(Currency),
    #[error("quantity limit reached")]
    QuantityOverflow,
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub option: Option<String>,
    pub name: String,
    pub image: String,
    /// Unit price per currency, captured when the line was first added.
    pub unit_prices: BTreeMap<Currency, Decimal>,
    pub quantity: u32,
}

impl CartItem {
    fn matches(&self, product_id: ProductId, option: Option<&str>) -> bool {
        self.product_id == product_id && self.option.as_deref() == option
    }

    #[must_use]
    pub fn unit_price(&self, currency: &Currency) -> Option<Decimal> {
        self.unit_prices.get(currency).copied()
    }

    /// `unit * quantity` in `currency`, if the line is priced in it.
    #[must_use]
    pub fn line_total(&self, currency: &Currency) -> Option<Decimal> {
        self.unit_price(currency)
            .map(|unit| unit * Decimal::from(self.quantity))
    }
}

/// Per-currency cart totals.
///
/// The key set is exactly the currencies priced by at least one line item.
/// Reading any other currency yields zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Totals(BTreeMap<Currency, Decimal>);

impl Totals {
    /// Sum `unit * quantity` per currency. A line without a price in some
    /// currency contributes nothing to that currency's total.
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        let mut totals = BTreeMap::new();
        for item in items {
            let quantity = Decimal::from(item.quantity);
            for (currency, unit) in &item.unit_prices {
                *totals.entry(currency.clone()).or_insert(Decimal::ZERO) += *unit * quantity;
            }
        }
        Self(totals)
    }

    #[must_use]
    pub fn get(&self, currency: &Currency) -> Decimal {
        self.0.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Currency, Decimal)> {
        self.0.iter().map(|(c, amount)| (c, *amount))
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.0.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Shape of a cart as persisted. Totals are never trusted from storage.
#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<CartItem>,
    preferred_currency: Currency,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        Self::from_parts(stored.items, stored.preferred_currency)
    }
}

/// A shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCart")]
pub struct Cart {
    items: Vec<CartItem>,
    preferred_currency: Currency,
    totals: Totals,
}

impl Cart {
    /// A fresh cart with no items, priced in `default_currency`.
    #[must_use]
    pub fn empty(default_currency: Currency) -> Self {
        Self {
            items: Vec::new(),
            preferred_currency: default_currency,
            totals: Totals::default(),
        }
    }

    fn from_parts(items: Vec<CartItem>, preferred_currency: Currency) -> Self {
        let totals = Totals::from_items(&items);
        Self {
            items,
            preferred_currency,
            totals,
        }
    }

    /// Line items in the order they were first added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn preferred_currency(&self) -> &Currency {
        &self.preferred_currency
    }

    #[must_use]
    pub const fn totals(&self) -> &Totals {
        &self.totals
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    #[must_use]
    pub fn total_in_preferred(&self) -> Decimal {
        self.totals.get(&self.preferred_currency)
    }

    /// e.g. `25.00 CAD`.
    #[must_use]
    pub fn display_total(&self) -> String {
        format_amount(self.total_in_preferred(), &self.preferred_currency)
    }

    /// Currencies the current items can be paid in.
    #[must_use]
    pub fn currencies(&self) -> BTreeSet<Currency> {
        self.totals.currencies().cloned().collect()
    }

    /// Whether the shopper has a real choice of settlement currency.
    #[must_use]
    pub fn offers_currency_choice(&self) -> bool {
        self.totals.len() >= 2
    }

    /// Lines with no price in the preferred currency. These cannot be
    /// checked out until the shopper switches currency or removes them.
    pub fn unpriced_items(&self) -> impl Iterator<Item = &CartItem> {
        self.items
            .iter()
            .filter(|item| item.unit_price(&self.preferred_currency).is_none())
    }
}

/// Add one unit of `product` (in variant `option`) to the cart.
///
/// `product` is whatever the catalog lookup returned; `None` is reported as
/// [`CartError::ProductNotFound`] rather than treated as a bug.
///
/// # Errors
///
/// - [`CartError::ProductNotFound`] if `product` is `None`
/// - [`CartError::OptionRequired`] if the product has options and none was chosen
/// - [`CartError::UnknownOption`] if the option is not one the product offers
/// - [`CartError::QuantityOverflow`] if the line quantity would overflow
pub fn add_to_cart(
    cart: &Cart,
    product: Option<&Product>,
    option: Option<&str>,
    wallets: &[Wallet],
) -> Result<Cart, CartError> {
    let product = product.ok_or(CartError::ProductNotFound)?;
    check_option(product, option)?;

    let mut items = cart.items.clone();
    if let Some(line) = items.iter_mut().find(|i| i.matches(product.id, option)) {
        line.quantity = line
            .quantity
            .checked_add(1)
            .ok_or(CartError::QuantityOverflow)?;
    } else {
        items.push(CartItem {
            product_id: product.id,
            option: option.map(str::to_owned),
            name: product.name.clone(),
            image: product.image.clone(),
            unit_prices: unit_prices(product, wallets),
            quantity: 1,
        });
    }

    Ok(Cart::from_parts(items, cart.preferred_currency.clone()))
}

fn check_option(product: &Product, option: Option<&str>) -> Result<(), CartError> {
    match option {
        None if product.has_options() => Err(CartError::OptionRequired {
            product: product.name.clone(),
        }),
        Some(chosen) if !product.offers_option(chosen) => Err(CartError::UnknownOption {
            product: product.name.clone(),
            option: chosen.to_owned(),
        }),
        _ => Ok(()),
    }
}

/// Drop the line for `(product_id, option)`. `None` only matches the line
/// without an option. Removing something not in the cart changes nothing.
#[must_use]
pub fn remove_from_cart(cart: &Cart, product_id: ProductId, option: Option<&str>) -> Cart {
    let items = cart
        .items
        .iter()
        .filter(|i| !i.matches(product_id, option))
        .cloned()
        .collect();
    Cart::from_parts(items, cart.preferred_currency.clone())
}

/// Switch the display currency. Stored totals are untouched.
///
/// # Errors
///
/// Returns [`CartError::UnsupportedCurrency`] if no wallet settles in `currency`.
pub fn set_currency(cart: &Cart, currency: Currency, wallets: &[Wallet]) -> Result<Cart, CartError> {
    if !wallets.iter().any(|w| w.currency == currency) {
        return Err(CartError::UnsupportedCurrency(currency));
    }
    Ok(Cart {
        preferred_currency: currency,
        ..cart.clone()
    })
}

/// Remove every line, keeping the preferred currency.
#[must_use]
pub fn empty_cart(cart: &Cart) -> Cart {
    Cart::empty(cart.preferred_currency.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::catalog::PriceTier;
    use crate::types::WalletId;

    fn cur(code: &str) -> Currency {
        Currency::parse(code).unwrap()
    }

    fn wallets() -> Vec<Wallet> {
        vec![
            Wallet {
                id: WalletId::new(1),
                currency: cur("CAD"),
                address: "pay@example.ca".to_owned(),
                display_name: "Interac e-Transfer".to_owned(),
            },
            Wallet {
                id: WalletId::new(2),
                currency: cur("BTC"),
                address: "bc1qexampleaddress".to_owned(),
                display_name: "Bitcoin".to_owned(),
            },
        ]
    }

    fn product(id: i32, name: &str, prices: &[(i32, Decimal)], options: &[&str]) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            friendly_link: name.to_lowercase(),
            description: String::new(),
            image: format!("{}.jpg", name.to_lowercase()),
            prices: prices
                .iter()
                .map(|&(wallet, price)| PriceTier {
                    price,
                    wallet_id: WalletId::new(wallet),
                })
                .collect(),
            options: options.iter().map(|&o| o.to_owned()).collect(),
        }
    }

    fn empty() -> Cart {
        Cart::empty(cur("CAD"))
    }

    #[test]
    fn test_empty_cart_has_zero_totals() {
        let cart = empty();
        assert!(cart.items().is_empty());
        assert_eq!(cart.total_in_preferred(), Decimal::ZERO);
        assert_eq!(cart.totals().get(&cur("BTC")), Decimal::ZERO);
        assert_eq!(cart.preferred_currency(), &cur("CAD"));
    }

    #[test]
    fn test_add_remove_scenario() {
        let w = wallets();
        let a = product(1, "A", &[(1, dec!(10))], &[]);
        let b = product(2, "B", &[(1, dec!(5))], &["S", "L"]);

        let cart = add_to_cart(&empty(), Some(&a), None, &w).unwrap();
        assert_eq!(cart.totals().get(&cur("CAD")), dec!(10));

        let cart = add_to_cart(&cart, Some(&a), None, &w).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.totals().get(&cur("CAD")), dec!(20));

        let cart = add_to_cart(&cart, Some(&b), Some("L"), &w).unwrap();
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.totals().get(&cur("CAD")), dec!(25));

        let cart = remove_from_cart(&cart, a.id, None);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.totals().get(&cur("CAD")), dec!(5));
    }

    #[test]
    fn test_variants_are_distinct_lines() {
        let w = wallets();
        let shirt = product(3, "Shirt", &[(1, dec!(20))], &["M", "L"]);

        let cart = add_to_cart(&empty(), Some(&shirt), Some("M"), &w).unwrap();
        let cart = add_to_cart(&cart, Some(&shirt), Some("L"), &w).unwrap();
        let cart = add_to_cart(&cart, Some(&shirt), Some("M"), &w).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].option.as_deref(), Some("M"));
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[1].option.as_deref(), Some("L"));
        assert_eq!(cart.items()[1].quantity, 1);
        assert_eq!(cart.total_in_preferred(), dec!(60));

        let cart = remove_from_cart(&cart, shirt.id, Some("M"));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].option.as_deref(), Some("L"));
    }

    #[test]
    fn test_remove_without_option_leaves_variants_alone() {
        let w = wallets();
        let plain = product(4, "Mug", &[(1, dec!(8))], &[]);
        let mut with_opts = product(4, "Mug", &[(1, dec!(8))], &["Blue"]);
        with_opts.options.push("Red".to_owned());

        let cart = add_to_cart(&empty(), Some(&with_opts), Some("Blue"), &w).unwrap();
        let cart = add_to_cart(&cart, Some(&plain), None, &w).unwrap();
        assert_eq!(cart.items().len(), 2);

        let cart = remove_from_cart(&cart, ProductId::new(4), None);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].option.as_deref(), Some("Blue"));
    }

    #[test]
    fn test_remove_missing_line_is_noop() {
        let w = wallets();
        let a = product(1, "A", &[(1, dec!(10))], &[]);
        let cart = add_to_cart(&empty(), Some(&a), None, &w).unwrap();

        assert_eq!(remove_from_cart(&cart, ProductId::new(99), None), cart);
        assert_eq!(remove_from_cart(&cart, a.id, Some("XL")), cart);
    }

    #[test]
    fn test_missing_product_is_an_error_not_a_panic() {
        let cart = empty();
        assert_eq!(
            add_to_cart(&cart, None, None, &wallets()),
            Err(CartError::ProductNotFound)
        );
    }

    #[test]
    fn test_option_validation() {
        let w = wallets();
        let shirt = product(3, "Shirt", &[(1, dec!(20))], &["M"]);
        let mug = product(4, "Mug", &[(1, dec!(8))], &[]);

        assert!(matches!(
            add_to_cart(&empty(), Some(&shirt), None, &w),
            Err(CartError::OptionRequired { .. })
        ));
        assert!(matches!(
            add_to_cart(&empty(), Some(&shirt), Some("XXL"), &w),
            Err(CartError::UnknownOption { .. })
        ));
        assert!(matches!(
            add_to_cart(&empty(), Some(&mug), Some("M"), &w),
            Err(CartError::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_quantity_overflow_is_reported() {
        let w = wallets();
        let a = product(1, "A", &[(1, dec!(1))], &[]);
        let cart = add_to_cart(&empty(), Some(&a), None, &w).unwrap();
        let mut json = serde_json::to_value(&cart).unwrap();
        json["items"][0]["quantity"] = serde_json::json!(u32::MAX);
        let full: Cart = serde_json::from_value(json).unwrap();

        assert_eq!(
            add_to_cart(&full, Some(&a), None, &w),
            Err(CartError::QuantityOverflow)
        );
    }

    #[test]
    fn test_multi_currency_totals_and_missing_prices() {
        let w = wallets();
        let both = product(1, "Both", &[(1, dec!(10)), (2, dec!(0.0002))], &[]);
        let cad_only = product(2, "CadOnly", &[(1, dec!(5))], &[]);

        let cart = add_to_cart(&empty(), Some(&both), None, &w).unwrap();
        let cart = add_to_cart(&cart, Some(&both), None, &w).unwrap();
        let cart = add_to_cart(&cart, Some(&cad_only), None, &w).unwrap();

        assert_eq!(cart.totals().get(&cur("CAD")), dec!(25));
        assert_eq!(cart.totals().get(&cur("BTC")), dec!(0.0004));
        assert!(cart.offers_currency_choice());
    }

    #[test]
    fn test_currency_choice_needs_two_currencies() {
        let w = wallets();
        let cad_only = product(2, "CadOnly", &[(1, dec!(5))], &[]);
        let cart = add_to_cart(&empty(), Some(&cad_only), None, &w).unwrap();
        assert!(!cart.offers_currency_choice());
        assert!(!empty().offers_currency_choice());
    }

    #[test]
    fn test_unpriced_items_follow_preferred_currency() {
        let w = wallets();
        let btc_only = product(3, "Node", &[(2, dec!(0.01))], &[]);
        let cad_only = product(2, "CadOnly", &[(1, dec!(5))], &[]);

        let cart = add_to_cart(&empty(), Some(&btc_only), None, &w).unwrap();
        assert!(!cart.offers_currency_choice());
        let unpriced: Vec<_> = cart.unpriced_items().map(|i| i.name.as_str()).collect();
        assert_eq!(unpriced, ["Node"]);

        let cart = set_currency(&cart, cur("BTC"), &w).unwrap();
        assert_eq!(cart.unpriced_items().count(), 0);

        let cart = add_to_cart(&cart, Some(&cad_only), None, &w).unwrap();
        let unpriced: Vec<_> = cart.unpriced_items().map(|i| i.name.as_str()).collect();
        assert_eq!(unpriced, ["CadOnly"]);
    }

    #[test]
    fn test_set_currency_keeps_totals() {
        let w = wallets();
        let both = product(1, "Both", &[(1, dec!(10)), (2, dec!(0.0002))], &[]);
        let cart = add_to_cart(&empty(), Some(&both), None, &w).unwrap();

        let switched = set_currency(&cart, cur("BTC"), &w).unwrap();
        assert_eq!(switched.preferred_currency(), &cur("BTC"));
        assert_eq!(switched.totals(), cart.totals());
        assert_eq!(switched.total_in_preferred(), dec!(0.0002));
        assert_eq!(switched.display_total(), "0.0002 BTC");
    }

    #[test]
    fn test_set_unsupported_currency() {
        assert_eq!(
            set_currency(&empty(), cur("XMR"), &wallets()),
            Err(CartError::UnsupportedCurrency(cur("XMR")))
        );
    }

    #[test]
    fn test_empty_cart_keeps_preferred_currency() {
        let w = wallets();
        let both = product(1, "Both", &[(1, dec!(10)), (2, dec!(0.0002))], &[]);
        let cart = add_to_cart(&empty(), Some(&both), None, &w).unwrap();
        let cart = set_currency(&cart, cur("BTC"), &w).unwrap();

        let cleared = empty_cart(&cart);
        assert!(cleared.items().is_empty());
        assert_eq!(cleared.preferred_currency(), &cur("BTC"));
        assert_eq!(cleared.totals().get(&cur("BTC")), Decimal::ZERO);
        assert_eq!(cleared.totals().get(&cur("CAD")), Decimal::ZERO);
    }

    #[test]
    fn test_stored_totals_are_recomputed() {
        let w = wallets();
        let a = product(1, "A", &[(1, dec!(10))], &[]);
        let cart = add_to_cart(&empty(), Some(&a), None, &w).unwrap();

        let mut json = serde_json::to_value(&cart).unwrap();
        json["totals"]["CAD"] = serde_json::json!("9999");
        let restored: Cart = serde_json::from_value(json).unwrap();

        assert_eq!(restored.total_in_preferred(), dec!(10));
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_totals_match_items_for_random_sequences() {
        let w = wallets();
        let catalog = [
            product(1, "A", &[(1, dec!(10)), (2, dec!(0.0002))], &[]),
            product(2, "B", &[(1, dec!(5.25))], &["S", "L"]),
            product(3, "C", &[(2, dec!(0.001))], &[]),
        ];
        let mut rng = StdRng::seed_from_u64(0x00c0_ffee);

        for _ in 0..200 {
            let mut cart = empty();
            for _ in 0..rng.random_range(1..30) {
                let p = &catalog[rng.random_range(0..catalog.len())];
                let option = p.has_options().then(|| {
                    if rng.random_bool(0.5) { "S" } else { "L" }
                });
                cart = if rng.random_bool(0.75) {
                    add_to_cart(&cart, Some(p), option, &w).unwrap()
                } else {
                    remove_from_cart(&cart, p.id, option)
                };
            }

            for currency in [cur("CAD"), cur("BTC")] {
                let expected: Decimal = cart
                    .items()
                    .iter()
                    .filter_map(|i| i.line_total(&currency))
                    .sum();
                assert_eq!(cart.totals().get(&currency), expected);
            }
        }
    }
}
