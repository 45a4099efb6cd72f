//! Browsing and cart flows through the full router.

use axum::http::StatusCode;

use crypto_cart_integration_tests::{
    HOODIE, RecordingMailer, STICKER, TEE, TestApp, test_config, wallets,
};
use crypto_cart_storefront::{db::MemoryCatalog, middleware::REQUEST_ID_HEADER};

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
async fn test_home_lists_products() {
    let (app, _) = TestApp::with_fixtures();

    let resp = app.get("/").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Sticker"));
    assert!(resp.body.contains("/product/logo-tee"));
    assert!(resp.body.contains("0.001 BTC / 60.00 CAD"));
    assert!(resp.body.contains("/static/images/products/hoodie.jpg"));
}

#[tokio::test]
async fn test_home_without_products_flashes() {
    let app = TestApp::build(
        test_config(),
        MemoryCatalog::new(Vec::new(), wallets()),
        std::sync::Arc::new(RecordingMailer::default()),
    );

    let resp = app.get("/").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Sorry, no products to show."));
}

#[tokio::test]
async fn test_empty_cart_page() {
    let (app, _) = TestApp::with_fixtures();

    let resp = app.get("/cart").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Your cart is empty"));
    assert!(!resp.body.contains("/cart/checkout"));
}

#[tokio::test]
async fn test_product_page() {
    let (app, _) = TestApp::with_fixtures();

    let resp = app.get_with_referer("/product/logo-tee", "/cart").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Logo Tee"));
    assert!(resp.body.contains("href=\"/cart\""));
    assert!(resp.body.contains("<option value=\"M\">M</option>"));
}

#[tokio::test]
async fn test_unknown_product_is_404_with_flash() {
    let (app, _) = TestApp::with_fixtures();

    let resp = app.get("/product/no-such-thing").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.contains("That product doesn"));
}

// ============================================================================
// Add / remove
// ============================================================================

#[tokio::test]
async fn test_add_and_remove_scenario() {
    let (app, _) = TestApp::with_fixtures();

    app.add(STICKER, None).await;
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Total: 10.00 CAD"));

    app.add(STICKER, None).await;
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("<td>2</td>"));
    assert!(cart.body.contains("Total: 20.00 CAD"));

    app.add(TEE, Some("L")).await;
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Logo Tee (L)"));
    assert!(cart.body.contains("Total: 25.00 CAD"));

    app.get(&format!("/cart/remove/{STICKER}"))
        .await
        .assert_redirect("/cart");
    let cart = app.get("/cart").await;
    assert!(!cart.body.contains("Sticker"));
    assert!(cart.body.contains("Logo Tee (L)"));
    assert!(cart.body.contains("Total: 5.00 CAD"));
}

#[tokio::test]
async fn test_variants_are_separate_lines() {
    let (app, _) = TestApp::with_fixtures();

    app.add(TEE, Some("S")).await;
    app.add(TEE, Some("M")).await;
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Logo Tee (S)"));
    assert!(cart.body.contains("Logo Tee (M)"));
    assert!(cart.body.contains("Total: 10.00 CAD"));

    app.get(&format!("/cart/remove/{TEE}/S"))
        .await
        .assert_redirect("/cart");
    let cart = app.get("/cart").await;
    assert!(!cart.body.contains("Logo Tee (S)"));
    assert!(cart.body.contains("Logo Tee (M)"));
}

#[tokio::test]
async fn test_cart_rows_post_one_more_of_the_same_line() {
    let (app, _) = TestApp::with_fixtures();

    app.add(TEE, Some("M")).await;
    app.add(STICKER, None).await;
    let cart = app.get("/cart").await;
    assert!(cart.body.contains(&format!("name=\"id\" value=\"{TEE}\"")));
    assert!(cart.body.contains("name=\"option\" value=\"M\""));
    assert!(cart.body.contains("name=\"option\" value=\"\""));

    // What each row's form submits.
    let tee = TEE.to_string();
    app.post_form("/cart", &[("id", tee.as_str()), ("option", "M")])
        .await
        .assert_redirect("/cart");
    let sticker = STICKER.to_string();
    app.post_form("/cart", &[("id", sticker.as_str()), ("option", "")])
        .await
        .assert_redirect("/cart");

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Total: 30.00 CAD"));
    let home = app.get("/").await;
    assert!(home.body.contains("Cart (4)"));
}

#[tokio::test]
async fn test_remove_without_option_keeps_variants() {
    let (app, _) = TestApp::with_fixtures();

    app.add(TEE, Some("M")).await;
    app.get(&format!("/cart/remove/{TEE}")).await;

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Logo Tee (M)"));
}

#[tokio::test]
async fn test_blank_option_on_plain_product() {
    let (app, _) = TestApp::with_fixtures();

    app.post_form("/cart", &[("id", "1"), ("option", "")])
        .await
        .assert_redirect("/cart");
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Total: 10.00 CAD"));
}

#[tokio::test]
async fn test_missing_option_goes_back_to_product() {
    let (app, _) = TestApp::with_fixtures();

    let id = TEE.to_string();
    app.post_form("/cart", &[("id", id.as_str())])
        .await
        .assert_redirect("/product/logo-tee");

    let page = app.get("/product/logo-tee").await;
    assert!(page.body.contains("please choose one"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_unknown_product_leaves_cart_alone() {
    let (app, _) = TestApp::with_fixtures();

    app.add(STICKER, None).await;
    app.post_form("/cart", &[("id", "999")])
        .await
        .assert_redirect("/");
    app.post_form("/cart", &[("id", "not-a-number")])
        .await
        .assert_redirect("/");

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Total: 10.00 CAD"));
}

#[tokio::test]
async fn test_header_shows_cart_summary() {
    let (app, _) = TestApp::with_fixtures();

    app.add(STICKER, None).await;
    app.add(TEE, Some("S")).await;
    let home = app.get("/").await;
    assert!(home.body.contains("Cart (2)"));
}

// ============================================================================
// Currency
// ============================================================================

#[tokio::test]
async fn test_currency_selector_needs_two_currencies() {
    let (app, _) = TestApp::with_fixtures();

    app.add(STICKER, None).await;
    let cart = app.get("/cart").await;
    assert!(!cart.body.contains("/cart/set-currency"));

    app.add(HOODIE, None).await;
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("/cart/set-currency"));
    assert!(cart.body.contains("<option value=\"BTC\">BTC</option>"));
}

#[tokio::test]
async fn test_set_currency() {
    let (app, _) = TestApp::with_fixtures();

    app.add(HOODIE, None).await;
    app.post_form("/cart/set-currency", &[("currency", "btc")])
        .await
        .assert_redirect("/");

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Total: 0.001 BTC"));
    assert!(cart.body.contains("<option value=\"BTC\" selected>BTC</option>"));
}

#[tokio::test]
async fn test_set_unsupported_currency() {
    let (app, _) = TestApp::with_fixtures();

    app.add(STICKER, None).await;
    app.post_form("/cart/set-currency", &[("currency", "XMR")])
        .await
        .assert_redirect("/");

    let home = app.get("/").await;
    assert!(home.body.contains("no wallet accepts XMR"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Total: 10.00 CAD"));
}

// ============================================================================
// Plumbing
// ============================================================================

#[tokio::test]
async fn test_request_id_header() {
    let (app, _) = TestApp::with_fixtures();

    let resp = app.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");
    assert!(resp.headers.contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_readiness_follows_catalog() {
    let (app, _) = TestApp::with_fixtures();

    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);

    app.catalog.set_offline(true);
    assert_eq!(
        app.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(app.get("/").await.status, StatusCode::SERVICE_UNAVAILABLE);
}
