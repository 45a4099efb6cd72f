//! In-process test harness for the storefront.
//!
//! [`TestApp`] builds the real router over an in-memory catalog, an
//! in-memory session store and a fake mailer, then drives it with
//! `tower::ServiceExt::oneshot`. The session cookie is carried between
//! requests like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p crypto-cart-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use rust_decimal_macros::dec;
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use crypto_cart_core::{Currency, PriceTier, Product, ProductId, Wallet, WalletId};
use crypto_cart_storefront::{
    app,
    config::{EmailConfig, StorefrontConfig},
    db::MemoryCatalog,
    middleware::{SESSION_COOKIE_NAME, create_session_layer},
    services::{EmailError, Mailer, OutgoingMail},
    state::AppState,
};

pub const STICKER: i32 = 1;
pub const TEE: i32 = 2;
pub const HOODIE: i32 = 3;
/// Not in [`products`]; see [`btc_only_product`].
pub const NODE: i32 = 4;

/// Mailer that keeps every message it is given.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// Mailer whose relay is always down.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), EmailError> {
        Err(EmailError::InvalidAddress("relay unavailable".to_owned()))
    }
}

pub fn currency(code: &str) -> Currency {
    Currency::parse(code).unwrap()
}

pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        store_name: "Test Shop".to_owned(),
        default_currency: currency("CAD"),
        legacy_wallet_address: None,
        order_bcc: None,
        static_dir: PathBuf::from("static"),
        email: EmailConfig {
            smtp_host: "localhost".to_owned(),
            smtp_port: 2525,
            smtp_username: "shop".to_owned(),
            smtp_password: SecretString::from("k8#Qz!v2Lp@9wXe"),
            from_address: "shop@example.com".to_owned(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

pub fn wallets() -> Vec<Wallet> {
    vec![
        Wallet {
            id: WalletId::new(1),
            currency: currency("CAD"),
            address: "pay@example.ca".to_owned(),
            display_name: "Interac e-Transfer".to_owned(),
        },
        Wallet {
            id: WalletId::new(2),
            currency: currency("BTC"),
            address: "bc1qexampleaddress".to_owned(),
            display_name: "Bitcoin".to_owned(),
        },
    ]
}

fn product(id: i32, name: &str, link: &str, prices: Vec<PriceTier>, options: &[&str]) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        friendly_link: link.to_owned(),
        description: format!("{name} description"),
        image: format!("{link}.jpg"),
        prices,
        options: options.iter().map(|o| (*o).to_owned()).collect(),
    }
}

/// Sticker (10 CAD), Logo Tee (5 CAD, sizes S/M/L), Hoodie (60 CAD or
/// 0.001 BTC).
pub fn products() -> Vec<Product> {
    let cad = |price| PriceTier {
        price,
        wallet_id: WalletId::new(1),
    };
    let btc = |price| PriceTier {
        price,
        wallet_id: WalletId::new(2),
    };
    vec![
        product(STICKER, "Sticker", "sticker", vec![cad(dec!(10))], &[]),
        product(TEE, "Logo Tee", "logo-tee", vec![cad(dec!(5))], &["S", "M", "L"]),
        product(
            HOODIE,
            "Hoodie",
            "hoodie",
            vec![cad(dec!(60)), btc(dec!(0.001))],
            &[],
        ),
    ]
}

/// Hardware node sold for 0.01 BTC only.
pub fn btc_only_product() -> Product {
    let btc = PriceTier {
        price: dec!(0.01),
        wallet_id: WalletId::new(2),
    };
    product(NODE, "Node", "node", vec![btc], &[])
}

/// A rendered response, fully buffered.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Location` of a redirect.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn assert_redirect(&self, to: &str) {
        assert!(
            self.status.is_redirection(),
            "expected redirect to {to}, got {}",
            self.status
        );
        assert_eq!(self.location(), Some(to));
    }
}

pub struct TestApp {
    router: Router,
    cookie: Mutex<Option<String>>,
    pub catalog: Arc<MemoryCatalog>,
}

impl TestApp {
    /// Full fixture catalog with a recording mailer.
    pub fn with_fixtures() -> (Self, Arc<RecordingMailer>) {
        let mailer = Arc::new(RecordingMailer::default());
        let app = Self::build(
            test_config(),
            MemoryCatalog::new(products(), wallets()),
            mailer.clone(),
        );
        (app, mailer)
    }

    pub fn build(
        config: StorefrontConfig,
        catalog: MemoryCatalog,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config, catalog.clone(), mailer);
        Self {
            router: app(state, session_layer),
            cookie: Mutex::new(None),
            catalog,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri), Body::empty()).await
    }

    pub async fn get_with_referer(&self, uri: &str, referer: &str) -> TestResponse {
        self.send(Request::get(uri).header(header::REFERER, referer), Body::empty())
            .await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
            Body::from(body),
        )
        .await
    }

    /// Add one unit of a product, asserting the cart accepted it.
    pub async fn add(&self, id: i32, option: Option<&str>) {
        let id = id.to_string();
        let mut fields = vec![("id", id.as_str())];
        if let Some(option) = option {
            fields.push(("option", option));
        }
        self.post_form("/cart", &fields)
            .await
            .assert_redirect("/cart");
    }

    async fn send(&self, builder: axum::http::request::Builder, body: Body) -> TestResponse {
        let cookie = self.cookie.lock().unwrap().clone();
        let builder = match cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        self.remember_cookie(response.headers());

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn remember_cookie(&self, headers: &HeaderMap) {
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let pair = value.split(';').next().unwrap_or_default().trim();
            let Some((name, cookie_value)) = pair.split_once('=') else {
                continue;
            };
            if name != SESSION_COOKIE_NAME {
                continue;
            }
            *self.cookie.lock().unwrap() = if cookie_value.is_empty() {
                None
            } else {
                Some(pair.to_owned())
            };
        }
    }
}
