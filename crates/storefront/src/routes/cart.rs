//! Cart route handlers.
//!
//! Every mutation follows the same shape: load the cart from the session,
//! run one cart-engine operation, store the result, redirect. When the
//! engine refuses an operation the stored cart is left alone.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument};

use crypto_cart_core::{
    Cart, CartError, CartItem, Currency, Email, ProductId, add_to_cart, empty_cart,
    format_amount, remove_from_cart, set_currency as set_cart_currency,
};

use super::{LayoutView, product_image_url};
use crate::error::{Result, add_breadcrumb};
use crate::models::{FlashMessage, load_cart, push_flash, store_cart};
use crate::services::{CheckoutError, is_deliverable};
use crate::state::AppState;

/// One row of the cart table.
pub struct CartLineView {
    pub label: String,
    pub image_url: String,
    pub unit_price: String,
    pub quantity: u32,
    pub remove_url: String,
    /// Posted back to `/cart` by the row's "add one more" form.
    pub product_id: String,
    /// Blank for lines without an option.
    pub option: String,
}

impl CartLineView {
    fn new(item: &CartItem, currency: &Currency) -> Self {
        Self {
            label: item
                .option
                .as_ref()
                .map_or_else(|| item.name.clone(), |o| format!("{} ({o})", item.name)),
            image_url: product_image_url(&item.image),
            unit_price: item
                .unit_price(currency)
                .map_or_else(|| "n/a".to_owned(), |p| format_amount(p, currency)),
            quantity: item.quantity,
            remove_url: remove_url(item),
            product_id: item.product_id.to_string(),
            option: item.option.clone().unwrap_or_default(),
        }
    }
}

/// `/cart/remove/{id}` or `/cart/remove/{id}/{option}`.
fn remove_url(item: &CartItem) -> String {
    match &item.option {
        Some(option) => format!(
            "/cart/remove/{}/{}",
            item.product_id,
            urlencoding::encode(option)
        ),
        None => format!("/cart/remove/{}", item.product_id),
    }
}

pub struct CurrencyChoice {
    pub code: String,
    pub selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub layout: LayoutView,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub show_currency_selector: bool,
    pub currencies: Vec<CurrencyChoice>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    #[serde(default)]
    pub id: String,
    pub option: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SetCurrencyForm {
    #[serde(default)]
    pub currency: String,
}

/// Blank form values mean "no option".
fn chosen_option(option: Option<&str>) -> Option<&str> {
    option.map(str::trim).filter(|o| !o.is_empty())
}

#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartTemplate> {
    let cart = load_cart(&session, &state.config().default_currency).await;
    let currency = cart.preferred_currency();

    Ok(CartTemplate {
        lines: cart
            .items()
            .iter()
            .map(|item| CartLineView::new(item, currency))
            .collect(),
        total: cart.display_total(),
        show_currency_selector: cart.offers_currency_choice()
            || cart.unpriced_items().next().is_some(),
        currencies: cart
            .currencies()
            .into_iter()
            .map(|c| CurrencyChoice {
                selected: &c == currency,
                code: c.to_string(),
            })
            .collect(),
        layout: LayoutView::load(&state, &session, &cart).await,
    })
}

/// Add one unit of a product.
///
/// An unknown product sends the shopper home with the cart untouched. An
/// option problem goes back to the product page with a flash message.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let cart = load_cart(&session, &state.config().default_currency).await;

    let product = match form.id.trim().parse::<ProductId>() {
        Ok(id) => state.catalog().product_by_id(id).await?,
        Err(_) => None,
    };
    let wallets = state.catalog().wallets().await?;
    let option = chosen_option(form.option.as_deref());

    match add_to_cart(&cart, product.as_ref(), option, &wallets) {
        Ok(next) => {
            store_cart(&session, &next).await?;
            add_breadcrumb(
                "cart",
                "Added to cart",
                &[("product_id", form.id.trim()), ("option", option.unwrap_or(""))],
            );
            Ok(Redirect::to("/cart"))
        }
        Err(CartError::ProductNotFound) => {
            push_flash(&session, FlashMessage::error("That product doesn't exist")).await?;
            Ok(Redirect::to("/"))
        }
        Err(e) => {
            push_flash(&session, FlashMessage::error(e.to_string())).await?;
            let back = product.map_or_else(
                || "/".to_owned(),
                |p| format!("/product/{}", p.friendly_link),
            );
            Ok(Redirect::to(&back))
        }
    }
}

async fn remove_line(
    state: &AppState,
    session: &Session,
    id: &str,
    option: Option<&str>,
) -> Result<Redirect> {
    // A malformed id cannot match any line.
    if let Ok(product_id) = id.trim().parse::<ProductId>() {
        let cart = load_cart(session, &state.config().default_currency).await;
        let next = remove_from_cart(&cart, product_id, option);
        store_cart(session, &next).await?;
        add_breadcrumb("cart", "Removed from cart", &[("product_id", id)]);
    }
    Ok(Redirect::to("/cart"))
}

/// Remove the line that has no option.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    remove_line(&state, &session, &id, None).await
}

#[instrument(skip(state, session))]
pub async fn remove_option(
    State(state): State<AppState>,
    session: Session,
    Path((id, option)): Path<(String, String)>,
) -> Result<Redirect> {
    remove_line(&state, &session, &id, chosen_option(Some(&option))).await
}

/// Change the settlement currency. Always lands on the home page.
#[instrument(skip(state, session))]
pub async fn set_currency(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SetCurrencyForm>,
) -> Result<Redirect> {
    let cart = load_cart(&session, &state.config().default_currency).await;

    let outcome: std::result::Result<Cart, String> = match Currency::parse(&form.currency) {
        Ok(currency) => {
            let wallets = state.catalog().wallets().await?;
            set_cart_currency(&cart, currency, &wallets).map_err(|e| e.to_string())
        }
        Err(e) => Err(e.to_string()),
    };

    match outcome {
        Ok(next) => store_cart(&session, &next).await?,
        Err(message) => {
            push_flash(
                &session,
                FlashMessage::error(format!("Can't pay in that currency: {message}")),
            )
            .await?;
        }
    }
    Ok(Redirect::to("/"))
}

/// Email the order and payment instructions, then empty the cart.
///
/// The cart is only cleared after the mail has been handed off.
#[instrument(skip(state, session, form))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Redirect> {
    let Some(email) = Email::parse(&form.email).ok().filter(is_deliverable) else {
        push_flash(
            &session,
            FlashMessage::error("Please enter a valid email address."),
        )
        .await?;
        return Ok(Redirect::to("/cart"));
    };

    let cart = load_cart(&session, &state.config().default_currency).await;
    if cart.is_empty() {
        push_flash(&session, FlashMessage::error("Your cart is empty")).await?;
        return Ok(Redirect::to("/cart"));
    }

    let wallets = state.catalog().wallets().await?;
    match state.notifier().send_order(&cart, &email, &wallets).await {
        Ok(()) => {}
        Err(CheckoutError::Unpriced { item, currency }) => {
            info!(%item, %currency, "Checkout refused, line not priced in cart currency");
            push_flash(
                &session,
                FlashMessage::error(format!(
                    "{item} can't be paid in {currency}. Choose another currency or remove it."
                )),
            )
            .await?;
            return Ok(Redirect::to("/cart"));
        }
        Err(e) => {
            error!(error = %e, "Checkout failed");
            push_flash(
                &session,
                FlashMessage::error("Sorry, we couldn't send your order email. Please try again."),
            )
            .await?;
            return Ok(Redirect::to("/cart"));
        }
    }

    store_cart(&session, &empty_cart(&cart)).await?;
    add_breadcrumb("checkout", "Order mailed", &[("domain", email.domain())]);
    push_flash(
        &session,
        FlashMessage::info(format!(
            "Thanks! Payment instructions have been sent to {email}."
        )),
    )
    .await?;
    Ok(Redirect::to("/"))
}
