//! Checkout through the full router.

#![allow(clippy::indexing_slicing)]

use std::sync::Arc;

use crypto_cart_integration_tests::{
    FailingMailer, HOODIE, NODE, RecordingMailer, STICKER, TestApp, btc_only_product, products,
    test_config, wallets,
};
use crypto_cart_storefront::db::MemoryCatalog;

#[tokio::test]
async fn test_checkout_mails_order_and_empties_cart() {
    let (app, mailer) = TestApp::with_fixtures();

    app.add(STICKER, None).await;
    app.add(STICKER, None).await;
    app.post_form("/cart/checkout", &[("email", " Buyer@Example.COM ")])
        .await
        .assert_redirect("/");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let mail = &sent[0];
    assert_eq!(mail.to.as_str(), "Buyer@example.com");
    assert_eq!(mail.subject, "Your Test Shop order");
    assert!(mail.text.contains("2 x Sticker @ 10.00 CAD = 20.00 CAD"));
    assert!(mail.text.contains("Total: 20.00 CAD"));
    assert!(mail.text.contains("pay@example.ca"));
    assert!(mail.html.contains("cid:payment-qr"));
    assert_eq!(mail.attachments.len(), 1);
    assert!(mail.attachments[0].body.starts_with(b"\x89PNG"));

    let home = app.get("/").await;
    assert!(home.body.contains("Payment instructions have been sent"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_checkout_pays_wallet_of_chosen_currency() {
    let (app, mailer) = TestApp::with_fixtures();

    app.add(HOODIE, None).await;
    app.post_form("/cart/set-currency", &[("currency", "BTC")])
        .await
        .assert_redirect("/");
    app.post_form("/cart/checkout", &[("email", "buyer@example.com")])
        .await
        .assert_redirect("/");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("bc1qexampleaddress"));
    assert!(sent[0].text.contains("Total: 0.001 BTC"));
}

#[tokio::test]
async fn test_mail_failure_keeps_cart() {
    let app = TestApp::build(
        test_config(),
        MemoryCatalog::new(products(), wallets()),
        Arc::new(FailingMailer),
    );

    app.add(STICKER, None).await;
    app.post_form("/cart/checkout", &[("email", "buyer@example.com")])
        .await
        .assert_redirect("/cart");

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("send your order email"));
    assert!(cart.body.contains("Total: 10.00 CAD"));
    assert!(!cart.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let (app, mailer) = TestApp::with_fixtures();

    app.add(STICKER, None).await;
    app.post_form("/cart/checkout", &[("email", "not-an-email")])
        .await
        .assert_redirect("/cart");

    assert!(mailer.sent().is_empty());
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Please enter a valid email address."));
    assert!(cart.body.contains("Total: 10.00 CAD"));
}

#[tokio::test]
async fn test_address_smtp_would_refuse_is_rejected() {
    let (app, mailer) = TestApp::with_fixtures();

    app.add(STICKER, None).await;
    for address in ["a,b@example.com", "a<b@example.com", "a(b)@example.com"] {
        app.post_form("/cart/checkout", &[("email", address)])
            .await
            .assert_redirect("/cart");
        let cart = app.get("/cart").await;
        assert!(cart.body.contains("Please enter a valid email address."));
        assert!(!cart.body.contains("send your order email"));
    }

    assert!(mailer.sent().is_empty());
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Total: 10.00 CAD"));
}

fn catalog_with_node() -> MemoryCatalog {
    let mut catalog = products();
    catalog.push(btc_only_product());
    MemoryCatalog::new(catalog, wallets())
}

#[tokio::test]
async fn test_line_not_priced_in_cart_currency_blocks_checkout() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = TestApp::build(test_config(), catalog_with_node(), mailer.clone());

    app.add(NODE, None).await;
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Total: 0.00 CAD"));
    assert!(cart.body.contains("/cart/set-currency"));
    assert!(cart.body.contains("<option value=\"BTC\">BTC</option>"));

    app.post_form("/cart/checkout", &[("email", "buyer@example.com")])
        .await
        .assert_redirect("/cart");
    assert!(mailer.sent().is_empty());

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("be paid in CAD"));
    assert!(cart.body.contains("Node"));
}

#[tokio::test]
async fn test_switching_currency_unblocks_checkout() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = TestApp::build(test_config(), catalog_with_node(), mailer.clone());

    app.add(NODE, None).await;
    app.post_form("/cart/set-currency", &[("currency", "BTC")])
        .await
        .assert_redirect("/");
    app.post_form("/cart/checkout", &[("email", "buyer@example.com")])
        .await
        .assert_redirect("/");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("1 x Node @ 0.01 BTC = 0.01 BTC"));
    assert!(sent[0].text.contains("bc1qexampleaddress"));
}

#[tokio::test]
async fn test_empty_cart_checkout_sends_nothing() {
    let (app, mailer) = TestApp::with_fixtures();

    app.post_form("/cart/checkout", &[("email", "buyer@example.com")])
        .await
        .assert_redirect("/cart");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_legacy_wallet_address_used_without_matching_wallet() {
    let mut config = test_config();
    config.legacy_wallet_address = Some("legacy-payment-address".to_owned());
    let mailer = Arc::new(RecordingMailer::default());
    // Only a BTC wallet exists, but carts default to CAD.
    let btc_only: Vec<_> = wallets()
        .into_iter()
        .filter(|w| w.currency.code() == "BTC")
        .collect();
    let app = TestApp::build(
        config,
        MemoryCatalog::new(products(), btc_only),
        mailer.clone(),
    );

    app.add(HOODIE, None).await;
    app.post_form("/cart/checkout", &[("email", "buyer@example.com")])
        .await
        .assert_redirect("/");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("legacy-payment-address"));
}
