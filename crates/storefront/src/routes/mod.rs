//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Landing page (product list)
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (catalog reachable)
//!
//! # Products
//! GET  /product/{friendly_link}     - Product detail
//!
//! # Cart
//! GET  /cart                        - Cart page
//! POST /cart                        - Add item (form: id, option)
//! GET  /cart/remove/{id}            - Remove the line without an option
//! GET  /cart/remove/{id}/{option}   - Remove the line for one option
//! POST /cart/set-currency           - Choose the settlement currency
//! POST /cart/checkout               - Email payment instructions
//! ```

pub mod cart;
pub mod health;
pub mod home;
pub mod products;

use std::collections::BTreeMap;

use axum::{
    Router,
    routing::{get, post},
};
use rust_decimal::Decimal;
use tower_sessions::Session;

use crypto_cart_core::{Cart, Currency, format_amount};

use crate::models::{FlashMessage, take_flash};
use crate::state::AppState;

/// Data every page's layout needs: shop name, pending flash messages and
/// the header cart summary.
pub struct LayoutView {
    pub store_name: String,
    pub messages: Vec<FlashMessage>,
    pub cart_count: u64,
    pub cart_total: String,
}

impl LayoutView {
    /// Drains the session's flash messages.
    pub async fn load(state: &AppState, session: &Session, cart: &Cart) -> Self {
        Self {
            store_name: state.config().store_name.clone(),
            messages: take_flash(session).await,
            cart_count: cart.item_count(),
            cart_total: cart.display_total(),
        }
    }
}

/// Public URL of a product image file.
#[must_use]
pub fn product_image_url(image: &str) -> String {
    format!("/static/images/products/{image}")
}

/// Every price of a product, e.g. `25.00 CAD / 0.0004 BTC`.
#[must_use]
pub fn price_list(prices: &BTreeMap<Currency, Decimal>) -> String {
    prices
        .iter()
        .map(|(currency, amount)| format_amount(*amount, currency))
        .collect::<Vec<_>>()
        .join(" / ")
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/remove/{id}", get(cart::remove))
        .route("/remove/{id}/{option}", get(cart::remove_option))
        .route("/set-currency", post(cart::set_currency))
        .route("/checkout", post(cart::checkout))
}

/// All storefront routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/product/{friendly_link}", get(products::show))
        .nest("/cart", cart_routes())
}
