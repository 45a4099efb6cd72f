//! Session-stored state: the shopper's cart and one-shot flash messages.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::warn;

use crypto_cart_core::{Cart, Currency};

/// Session keys.
pub mod session_keys {
    /// The shopper's cart, serialized as JSON.
    pub const CART: &str = "cart";

    /// Pending flash messages, drained on the next page render.
    pub const FLASH: &str = "flash";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Error,
}

impl FlashLevel {
    /// CSS class used by the layout template.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Info => "alert-info",
            Self::Error => "alert-danger",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            text: text.into(),
        }
    }
}

/// Read the cart from the session.
///
/// A missing cart, or one that no longer decodes, is an empty cart in
/// `default_currency`.
pub async fn load_cart(session: &Session, default_currency: &Currency) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(Some(cart)) => cart,
        Ok(None) => Cart::empty(default_currency.clone()),
        Err(e) => {
            warn!(error = %e, "Discarding unreadable cart");
            Cart::empty(default_currency.clone())
        }
    }
}

/// Replace the session's cart.
///
/// # Errors
///
/// Returns the session error if the store rejects the write.
pub async fn store_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Queue a flash message for the next page.
///
/// # Errors
///
/// Returns the session error if the store rejects the write.
pub async fn push_flash(
    session: &Session,
    message: FlashMessage,
) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<FlashMessage> = session
        .get(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(message);
    session.insert(session_keys::FLASH, pending).await
}

/// Drain all pending flash messages.
pub async fn take_flash(session: &Session) -> Vec<FlashMessage> {
    match session.remove::<Vec<FlashMessage>>(session_keys::FLASH).await {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Dropping unreadable flash messages");
            Vec::new()
        }
    }
}
