//! Landing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use crypto_cart_core::{Product, ProductId, Wallet, unit_prices};

use super::{LayoutView, price_list, product_image_url};
use crate::error::Result;
use crate::models::{FlashMessage, load_cart, push_flash};
use crate::state::AppState;

/// Product tile on the landing page.
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub url: String,
    pub image_url: String,
    pub prices: String,
    pub has_options: bool,
}

impl ProductCardView {
    fn new(product: &Product, wallets: &[Wallet]) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            url: format!("/product/{}", product.friendly_link),
            image_url: product_image_url(&product.image),
            prices: price_list(&unit_prices(product, wallets)),
            has_options: product.has_options(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub layout: LayoutView,
    pub products: Vec<ProductCardView>,
}

#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Result<IndexTemplate> {
    let products = state.catalog().list_products().await?;
    let wallets = state.catalog().wallets().await?;

    if products.is_empty() {
        push_flash(&session, FlashMessage::info("Sorry, no products to show.")).await?;
    }

    let cart = load_cart(&session, &state.config().default_currency).await;
    Ok(IndexTemplate {
        layout: LayoutView::load(&state, &session, &cart).await,
        products: products
            .iter()
            .map(|p| ProductCardView::new(p, &wallets))
            .collect(),
    })
}
