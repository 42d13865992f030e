//! Database integration tests for the storefront repositories.
//!
//! These tests require a running `PostgreSQL` database reachable through
//! `TEST_DATABASE_URL`. Migrations are applied on connect.
//!
//! Run with: cargo test -p paperback-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use paperback_core::{OrderState, OrderViolation, RatingScore};
use paperback_integration_tests::{TestContext, unique_email};
use paperback_storefront::db::{
    BookRepository, IdentityRepository, OrderRepository, RatingRepository, RepositoryError,
    SaveOutcome, WishlistRepository,
};
use paperback_storefront::services::auth::{AuthError, AuthService};
use paperback_storefront::services::oauth::{AuthInfo, AuthPayload};
use rust_decimal::Decimal;
use uuid::Uuid;

async fn context() -> TestContext {
    TestContext::connect()
        .await
        .expect("Failed to prepare test database")
}

fn payload(provider: &str, uid: &str, email: Option<String>) -> AuthPayload {
    AuthPayload {
        provider: provider.to_owned(),
        uid: uid.to_owned(),
        info: AuthInfo { email },
    }
}

async fn identity_count(ctx: &TestContext, provider: &str, uid: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM storefront.identity WHERE provider = $1 AND uid = $2",
    )
    .bind(provider)
    .bind(uid)
    .fetch_one(&ctx.pool)
    .await
    .unwrap()
}

// ============================================================================
// Wishlist
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_wishlist_rejects_duplicate_book() {
    let ctx = context().await;
    let user = ctx.create_user().await.unwrap();
    let book = ctx.create_book(999, 3).await.unwrap();
    let wishlist = WishlistRepository::new(&ctx.pool);

    wishlist.add(user.id, book.id).await.unwrap();
    let second = wishlist.add(user.id, book.id).await;
    assert!(matches!(second, Err(RepositoryError::Conflict(_))));

    let books = wishlist.list(user.id).await.unwrap();
    assert_eq!(books.len(), 1);

    assert!(wishlist.remove(user.id, book.id).await.unwrap());
    assert!(!wishlist.remove(user.id, book.id).await.unwrap());
    assert!(!wishlist.contains(user.id, book.id).await.unwrap());
}

// ============================================================================
// Ratings
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_rating_is_replaced_per_user() {
    let ctx = context().await;
    let user = ctx.create_user().await.unwrap();
    let book = ctx.create_book(1250, 1).await.unwrap();
    let ratings = RatingRepository::new(&ctx.pool);

    ratings
        .upsert(user.id, book.id, RatingScore::new(2).unwrap(), None)
        .await
        .unwrap();
    ratings
        .upsert(user.id, book.id, RatingScore::new(5).unwrap(), Some("Better on reread"))
        .await
        .unwrap();

    let list = ratings.list_for_book(book.id).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(
        ratings.average_for_book(book.id).await.unwrap(),
        Some(Decimal::new(50, 1))
    );
}

// ============================================================================
// OAuth sign-in
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_oauth_creates_user_then_reuses_identity() {
    let ctx = context().await;
    let auth = AuthService::new(&ctx.pool);
    let uid = Uuid::new_v4().to_string();
    let email = unique_email("oauth");

    let created = auth
        .find_for_oauth(&payload("facebook", &uid, Some(email.clone())))
        .await
        .unwrap();
    assert_eq!(created.email.as_str(), email);
    assert_eq!(identity_count(&ctx, "facebook", &uid).await, 1);

    // The email may change at the provider; the identity still wins
    let again = auth
        .find_for_oauth(&payload("facebook", &uid, Some(unique_email("changed"))))
        .await
        .unwrap();
    assert_eq!(again.id, created.id);
    assert_eq!(identity_count(&ctx, "facebook", &uid).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_oauth_links_identity_to_existing_email() {
    let ctx = context().await;
    let auth = AuthService::new(&ctx.pool);
    let email = unique_email("linked");
    let user = auth
        .register_with_password(&email, "correct horse", "correct horse", None)
        .await
        .unwrap();

    let uid = Uuid::new_v4().to_string();
    let signed_in = auth
        .find_for_oauth(&payload("facebook", &uid, Some(email.to_uppercase())))
        .await
        .unwrap();

    assert_eq!(signed_in.id, user.id);
    let identities = IdentityRepository::new(&ctx.pool)
        .list_for_user(user.id)
        .await
        .unwrap();
    assert_eq!(identities.len(), 1);
    assert!(auth.has_password(user.id).await.unwrap());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_oauth_without_email_cannot_create_user() {
    let ctx = context().await;
    let auth = AuthService::new(&ctx.pool);
    let uid = Uuid::new_v4().to_string();

    let result = auth.find_for_oauth(&payload("facebook", &uid, None)).await;
    assert!(matches!(result, Err(AuthError::MissingEmail { .. })));
    assert_eq!(identity_count(&ctx, "facebook", &uid).await, 0);
}

// ============================================================================
// Cart and orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_adding_same_book_twice_increments_quantity() {
    let ctx = context().await;
    let user = ctx.create_user().await.unwrap();
    let book = ctx.create_book(999, 5).await.unwrap();
    let orders = OrderRepository::new(&ctx.pool);

    let cart = orders.current_cart(user.id).await.unwrap();
    assert_eq!(cart.state, OrderState::InProgress);
    assert!(orders.add_book(cart.id, &book).await.unwrap().is_saved());

    let SaveOutcome::Saved(cart) = orders.add_book(cart.id, &book).await.unwrap() else {
        panic!("second add should save");
    };
    assert_eq!(cart.total_price, Decimal::new(1998, 2));

    let items = orders.items(cart.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().unwrap().quantity, 2);

    // Same cart comes back instead of a second one
    assert_eq!(orders.current_cart(user.id).await.unwrap().id, cart.id);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_price_change_starts_new_line_item() {
    let ctx = context().await;
    let user = ctx.create_user().await.unwrap();
    let book = ctx.create_book(999, 5).await.unwrap();
    let orders = OrderRepository::new(&ctx.pool);

    let cart = orders.current_cart(user.id).await.unwrap();
    assert!(orders.add_book(cart.id, &book).await.unwrap().is_saved());

    sqlx::query("UPDATE storefront.book SET price = $2 WHERE id = $1")
        .bind(book.id)
        .bind(Decimal::new(1250, 2))
        .execute(&ctx.pool)
        .await
        .unwrap();
    let repriced = BookRepository::new(&ctx.pool)
        .get_by_id(book.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(repriced.price.amount(), Decimal::new(1250, 2));

    let SaveOutcome::Saved(cart) = orders.add_book(cart.id, &repriced).await.unwrap() else {
        panic!("add at the new price should save");
    };
    assert_eq!(cart.total_price, Decimal::new(2249, 2));

    let items = orders.items(cart.id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item.quantity == 1 && item.book_id == book.id));
    let mut prices: Vec<Decimal> = items.iter().map(|item| item.price.amount()).collect();
    prices.sort();
    assert_eq!(prices, vec![Decimal::new(999, 2), Decimal::new(1250, 2)]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_quantity_is_capped_by_stock() {
    let ctx = context().await;
    let user = ctx.create_user().await.unwrap();
    let book = ctx.create_book(500, 2).await.unwrap();
    let orders = OrderRepository::new(&ctx.pool);

    let cart = orders.current_cart(user.id).await.unwrap();
    orders.add_book(cart.id, &book).await.unwrap();
    let item = orders.items(cart.id).await.unwrap().remove(0);

    let outcome = orders
        .update_item_quantity(item.id, 3, book.stock)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        SaveOutcome::Invalid(ref v) if v == &[OrderViolation::QuantityExceedsStock { stock: 2 }]
    ));

    let SaveOutcome::Saved(cart) = orders
        .update_item_quantity(item.id, 2, book.stock)
        .await
        .unwrap()
    else {
        panic!("quantity within stock should save");
    };
    assert_eq!(cart.total_price, Decimal::new(1000, 2));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_empty_cart_cannot_be_placed() {
    let ctx = context().await;
    let user = ctx.create_user().await.unwrap();
    let orders = OrderRepository::new(&ctx.pool);

    let cart = orders.current_cart(user.id).await.unwrap();
    let outcome = orders.transition(cart.id, OrderState::InQueue).await.unwrap();

    assert!(matches!(
        outcome,
        SaveOutcome::Invalid(ref v) if v.contains(&OrderViolation::TotalBelowMinimum)
    ));
    let reloaded = orders.get_by_id(cart.id).await.unwrap().unwrap();
    assert_eq!(reloaded.state, OrderState::InProgress);
    assert!(reloaded.completed_at.is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_checkout_walks_the_lifecycle() {
    let ctx = context().await;
    let user = ctx.create_user().await.unwrap();
    let book = ctx.create_book(1500, 4).await.unwrap();
    let orders = OrderRepository::new(&ctx.pool);

    let cart = orders.current_cart(user.id).await.unwrap();
    orders.add_book(cart.id, &book).await.unwrap();

    let SaveOutcome::Saved(placed) = orders.transition(cart.id, OrderState::InQueue).await.unwrap()
    else {
        panic!("checkout should save");
    };
    assert!(placed.completed_at.is_some());
    assert_eq!(orders.last_order(user.id).await.unwrap().unwrap().id, placed.id);
    assert!(orders.find_cart(user.id).await.unwrap().is_none());

    // A placed order is frozen
    assert!(matches!(
        orders.add_book(placed.id, &book).await.unwrap(),
        SaveOutcome::Invalid(ref v) if v == &[OrderViolation::NotEditable]
    ));

    // No skipping states
    assert!(matches!(
        orders.transition(placed.id, OrderState::Delivered).await.unwrap(),
        SaveOutcome::Invalid(_)
    ));

    assert!(orders.transition(placed.id, OrderState::InDelivery).await.unwrap().is_saved());
    let SaveOutcome::Saved(delivered) =
        orders.transition(placed.id, OrderState::Delivered).await.unwrap()
    else {
        panic!("delivery should save");
    };
    assert_eq!(delivered.completed_at, placed.completed_at);
    assert!(orders.last_order(user.id).await.unwrap().is_none());

    let next_cart = orders.current_cart(user.id).await.unwrap();
    assert_ne!(next_cart.id, placed.id);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_removing_last_item_zeroes_total() {
    let ctx = context().await;
    let user = ctx.create_user().await.unwrap();
    let book = ctx.create_book(999, 1).await.unwrap();
    let orders = OrderRepository::new(&ctx.pool);

    let cart = orders.current_cart(user.id).await.unwrap();
    orders.add_book(cart.id, &book).await.unwrap();
    let item = orders.items(cart.id).await.unwrap().remove(0);

    let SaveOutcome::Saved(cart) = orders.remove_item(item.id).await.unwrap() else {
        panic!("removal should save");
    };
    assert_eq!(cart.total_price, Decimal::ZERO);
    assert!(orders.items(cart.id).await.unwrap().is_empty());
}
