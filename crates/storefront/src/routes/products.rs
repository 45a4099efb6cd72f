//! Product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crypto_cart_core::{Product, ProductId, Wallet, unit_prices};

use super::{LayoutView, price_list, product_image_url};
use crate::error::Result;
use crate::models::{FlashMessage, load_cart, push_flash};
use crate::state::AppState;

pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub prices: String,
    pub options: Vec<String>,
    pub has_options: bool,
}

impl ProductView {
    fn new(product: &Product, wallets: &[Wallet]) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            image_url: product_image_url(&product.image),
            prices: price_list(&unit_prices(product, wallets)),
            options: product.options.clone(),
            has_options: product.has_options(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub layout: LayoutView,
    pub product: ProductView,
    pub back_url: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub layout: LayoutView,
}

/// Where the "back" link points: the referring page, or home.
fn back_url(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|r| r.starts_with('/') || r.starts_with("http://") || r.starts_with("https://"))
        .unwrap_or("/")
        .to_owned()
}

#[instrument(skip(state, session, headers))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(friendly_link): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let cart = load_cart(&session, &state.config().default_currency).await;

    let Some(product) = state.catalog().product_by_link(&friendly_link).await? else {
        push_flash(&session, FlashMessage::error("That product doesn't exist")).await?;
        let page = NotFoundTemplate {
            layout: LayoutView::load(&state, &session, &cart).await,
        };
        return Ok((StatusCode::NOT_FOUND, page).into_response());
    };

    let wallets = state.catalog().wallets().await?;
    Ok(ProductTemplate {
        layout: LayoutView::load(&state, &session, &cart).await,
        product: ProductView::new(&product, &wallets),
        back_url: back_url(&headers),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_back_url() {
        let mut headers = HeaderMap::new();
        assert_eq!(back_url(&headers), "/");

        headers.insert(header::REFERER, HeaderValue::from_static("/cart"));
        assert_eq!(back_url(&headers), "/cart");

        headers.insert(header::REFERER, HeaderValue::from_static("javascript:alert(1)"));
        assert_eq!(back_url(&headers), "/");
    }
}
