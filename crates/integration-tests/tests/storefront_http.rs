//! End-to-end tests against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (pb-cli migrate)
//! - The storefront running (cargo run -p paperback-storefront)
//!
//! Run with: cargo test -p paperback-integration-tests -- --ignored

use paperback_integration_tests::unique_email;
use reqwest::{Client, StatusCode, header, redirect};

/// Base URL for the storefront (configurable via environment).
fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps cookies and reports redirects instead of following them.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn sign_up(client: &Client, email: &str) {
    let resp = client
        .post(format!("{}/users/sign_up", storefront_base_url()))
        .form(&[
            ("email", email),
            ("password", "paperback-pass"),
            ("password_confirmation", "paperback-pass"),
        ])
        .send()
        .await
        .expect("Failed to sign up");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

// ============================================================================
// Public pages
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_and_catalog_are_public() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to get health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    for path in ["/", "/books", "/categories", "/users/sign_in", "/users/sign_up"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to get page");
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_locale_flashes_warning() {
    let client = client();
    let body = client
        .get(format!("{}/books?locale=xx", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get books")
        .text()
        .await
        .expect("Failed to read response");

    assert!(body.contains("xx translation not available"));
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_private_pages_redirect_when_signed_out() {
    let client = client();
    let base_url = storefront_base_url();

    for path in ["/cart", "/orders", "/wishlist", "/users/edit"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to get page");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), "/users/sign_in", "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_sign_up_sign_out_sign_in() {
    let client = client();
    let base_url = storefront_base_url();
    let email = unique_email("http");

    sign_up(&client, &email).await;

    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/users/sign_out"))
        .send()
        .await
        .expect("Failed to sign out");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .post(format!("{base_url}/users/sign_in"))
        .form(&[("email", email.as_str()), ("password", "wrong-password")])
        .send()
        .await
        .expect("Failed to sign in");
    assert_eq!(location(&resp), "/users/sign_in");

    let resp = client
        .post(format!("{base_url}/users/sign_in"))
        .form(&[("email", email.as_str()), ("password", "paperback-pass")])
        .send()
        .await
        .expect("Failed to sign in");
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_empty_cart_checkout_warns() {
    let client = client();
    let base_url = storefront_base_url();
    sign_up(&client, &unique_email("checkout")).await;

    let resp = client
        .post(format!("{base_url}/cart/checkout"))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart");

    let body = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("Your cart is empty."));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_foreign_order_redirects_with_flash() {
    let client = client();
    let base_url = storefront_base_url();
    sign_up(&client, &unique_email("snoop")).await;

    // Order 1 belongs to someone else (or does not exist) for a fresh account
    let resp = client
        .get(format!("{base_url}/orders/1"))
        .send()
        .await
        .expect("Failed to get order");

    match resp.status() {
        StatusCode::NOT_FOUND => {}
        StatusCode::SEE_OTHER => {
            assert_eq!(location(&resp), "/");
            let body = client
                .get(format!("{base_url}/"))
                .send()
                .await
                .expect("Failed to get home")
                .text()
                .await
                .expect("Failed to read response");
            assert!(body.contains("You are not authorized to access this page."));
        }
        other => panic!("unexpected status {other}"),
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_alert_query_is_ignored() {
    let body = client()
        .get(format!("{}/?alert=Your%20account%20is%20locked", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get home")
        .text()
        .await
        .expect("Failed to read response");

    assert!(!body.contains("Your account is locked"));
}
