//! Checkout notifier.
//!
//! Checkout does not take payment. It mails the shopper their order and a QR
//! code for the wallet they should pay, then the route clears the cart. The
//! steps run in order and the first failure stops the pipeline:
//!
//! 1. check every line has a price in the cart's currency
//! 2. pick the wallet to pay
//! 3. render the plain-text order
//! 4. encode that wallet's address as a QR PNG
//! 5. render the HTML order, referencing the QR by `cid:`
//! 6. hand the message to the [`Mailer`]

use std::sync::Arc;

use askama::Template;
use thiserror::Error;
use tracing::instrument;

use crypto_cart_core::{Cart, CartItem, Currency, Email, Wallet, format_amount};

use super::email::{EmailError, MailAttachment, Mailer, OutgoingMail};
use super::qr::{QrError, payment_qr_png};

/// Content-ID of the inline QR image.
pub const QR_CONTENT_ID: &str = "payment-qr";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("{item} has no price in {currency}")]
    Unpriced { item: String, currency: Currency },
    #[error("no wallet configured for {0}")]
    NoWallet(Currency),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("QR error: {0}")]
    Qr(#[from] QrError),
    #[error("email error: {0}")]
    Email(#[from] EmailError),
}

/// Where the shopper should send payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payee {
    pub display_name: String,
    pub address: String,
}

struct OrderLine {
    label: String,
    quantity: u32,
    unit_price: String,
    line_total: String,
}

impl OrderLine {
    fn new(item: &CartItem, currency: &Currency) -> Self {
        let price = |amount: Option<rust_decimal::Decimal>| {
            amount.map_or_else(|| "n/a".to_owned(), |a| format_amount(a, currency))
        };
        Self {
            label: item
                .option
                .as_ref()
                .map_or_else(|| item.name.clone(), |o| format!("{} ({o})", item.name)),
            quantity: item.quantity,
            unit_price: price(item.unit_price(currency)),
            line_total: price(item.line_total(currency)),
        }
    }
}

#[derive(Template)]
#[template(path = "email/order.txt")]
struct OrderEmailText<'a> {
    store_name: &'a str,
    lines: &'a [OrderLine],
    total: &'a str,
    payee: &'a Payee,
}

#[derive(Template)]
#[template(path = "email/order.html")]
struct OrderEmailHtml<'a> {
    store_name: &'a str,
    lines: &'a [OrderLine],
    total: &'a str,
    payee: &'a Payee,
    qr_cid: &'a str,
}

/// Renders and sends order mail.
#[derive(Clone)]
pub struct CheckoutNotifier {
    mailer: Arc<dyn Mailer>,
    store_name: String,
    legacy_wallet_address: Option<String>,
    order_bcc: Option<String>,
}

impl CheckoutNotifier {
    #[must_use]
    pub fn new(
        mailer: Arc<dyn Mailer>,
        store_name: impl Into<String>,
        legacy_wallet_address: Option<String>,
        order_bcc: Option<String>,
    ) -> Self {
        Self {
            mailer,
            store_name: store_name.into(),
            legacy_wallet_address,
            order_bcc,
        }
    }

    /// First wallet in the cart's currency, else the single configured
    /// address.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::NoWallet`] when neither exists.
    pub fn payee(&self, cart: &Cart, wallets: &[Wallet]) -> Result<Payee, CheckoutError> {
        let currency = cart.preferred_currency();
        if let Some(wallet) = wallets.iter().find(|w| &w.currency == currency) {
            return Ok(Payee {
                display_name: wallet.display_name.clone(),
                address: wallet.address.clone(),
            });
        }
        self.legacy_wallet_address
            .as_ref()
            .map(|address| Payee {
                display_name: currency.to_string(),
                address: address.clone(),
            })
            .ok_or_else(|| CheckoutError::NoWallet(currency.clone()))
    }

    /// Mail the order in `cart` to `to`. The cart itself is not touched.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; nothing is sent in that case
    /// unless the failure was in delivery itself.
    #[instrument(
        skip_all,
        fields(items = cart.items().len(), currency = %cart.preferred_currency())
    )]
    pub async fn send_order(
        &self,
        cart: &Cart,
        to: &Email,
        wallets: &[Wallet],
    ) -> Result<(), CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let currency = cart.preferred_currency();
        if let Some(item) = cart.unpriced_items().next() {
            return Err(CheckoutError::Unpriced {
                item: item.name.clone(),
                currency: currency.clone(),
            });
        }

        let lines: Vec<OrderLine> = cart
            .items()
            .iter()
            .map(|item| OrderLine::new(item, currency))
            .collect();
        let total = cart.display_total();

        let payee = self.payee(cart, wallets)?;
        let text = OrderEmailText {
            store_name: &self.store_name,
            lines: &lines,
            total: &total,
            payee: &payee,
        }
        .render()?;

        let qr = payment_qr_png(&payee.address)?;

        let html = OrderEmailHtml {
            store_name: &self.store_name,
            lines: &lines,
            total: &total,
            payee: &payee,
            qr_cid: QR_CONTENT_ID,
        }
        .render()?;

        let mail = OutgoingMail {
            to: to.clone(),
            bcc: self.order_bcc.clone(),
            subject: format!("Your {} order", self.store_name),
            text,
            html,
            attachments: vec![MailAttachment {
                filename: "payment-qr.png".to_owned(),
                content_type: "image/png".to_owned(),
                content_id: Some(QR_CONTENT_ID.to_owned()),
                body: qr,
            }],
        };

        self.mailer.send(mail).await?;
        Ok(())
    }
}
