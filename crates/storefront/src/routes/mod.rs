//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Database readiness check
//! GET  /static/*                        - Stylesheet
//!
//! # Catalog
//! GET  /                                - Book listing
//! GET  /books                           - Book listing (?category=&page=)
//! GET  /books/{id}                      - Book detail with ratings
//! POST /books/{id}/ratings              - Rate a book
//! GET  /categories                      - Category listing
//!
//! # Cart & Orders (requires auth)
//! GET  /cart                            - Current cart
//! POST /cart/checkout                   - Place the cart
//! POST /order_items                     - Add a book to the cart
//! PATCH|POST /order_items/{id}          - Change quantity
//! DELETE /order_items/{id}              - Remove a line item
//! POST /order_items/{id}/delete         - Remove a line item (HTML forms)
//! GET  /orders                          - Cart and orders by state
//! GET  /orders/{id}                     - Order detail
//!
//! # Wishlist (requires auth)
//! GET  /wishlist                        - Saved books
//! POST /wishlist/{book_id}              - Save a book
//! DELETE /wishlist/{book_id}            - Remove a book
//! POST /wishlist/{book_id}/delete       - Remove a book (HTML forms)
//!
//! # Users
//! GET|POST /users/sign_up               - Register with a password
//! GET|POST /users/sign_in               - Sign in with a password
//! POST /users/sign_out                  - Sign out
//! GET|POST /users/edit                  - Account settings (requires auth)
//! GET  /users/auth/{provider}           - Start OAuth sign-in
//! GET  /users/auth/{provider}/callback  - Finish OAuth sign-in
//! ```

pub mod account;
pub mod auth;
pub mod books;
pub mod cart;
pub mod categories;
pub mod oauth;
pub mod order_items;
pub mod orders;
pub mod ratings;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    create_session_layer, locale_middleware, pending_alert_middleware, request_id_middleware,
};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(books::index))
        .route("/{id}", get(books::show))
        .route("/{id}/ratings", post(ratings::create))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/checkout", post(cart::checkout))
}

/// Create the line item routes router.
pub fn order_item_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(order_items::create))
        .route(
            "/{id}",
            post(order_items::update)
                .patch(order_items::update)
                .delete(order_items::destroy),
        )
        .route("/{id}/delete", post(order_items::destroy))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route("/{book_id}", post(wishlist::add).delete(wishlist::remove))
        .route("/{book_id}/delete", post(wishlist::remove))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/sign_up", get(auth::sign_up_page).post(auth::sign_up))
        .route("/sign_in", get(auth::sign_in_page).post(auth::sign_in))
        .route("/sign_out", post(auth::sign_out))
        .route("/edit", get(account::edit_page).post(account::update))
        .route("/auth/{provider}", get(oauth::authorize))
        .route("/auth/{provider}/callback", get(oauth::callback))
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(books::index))
        .nest("/books", book_routes())
        .route("/categories", get(categories::index))
        .nest("/cart", cart_routes())
        .nest("/order_items", order_item_routes())
        .nest("/orders", order_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/users", user_routes())
}

/// Build the full application: health checks, pages, and the middleware stack.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        // Both need the session, so they sit inside the session layer
        .layer(from_fn(pending_alert_middleware))
        .layer(from_fn_with_state(state.clone(), locale_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Upper-case the first character: `facebook` -> `Facebook`.
pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{LocaleConfig, OAuthConfig, StorefrontConfig};

    /// State backed by a pool that never connects unless a query runs.
    fn test_state() -> AppState {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/paperback_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("k8Qz2vR7mN4pX1wL9tY6bH3jF5cD0sA8"),
            locales: LocaleConfig::parse("en,de", None).unwrap(),
            oauth: OAuthConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/paperback_test")
            .unwrap();
        AppState::new(config, pool).unwrap()
    }

    async fn get(uri: &str) -> axum::response::Response {
        app(test_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = get("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
    }

    #[tokio::test]
    async fn test_signed_out_users_are_sent_to_sign_in() {
        for uri in ["/cart", "/orders", "/orders/1", "/wishlist", "/users/edit"] {
            let response = get(uri).await;
            assert!(response.status().is_redirection(), "{uri}");
            assert_eq!(
                response.headers().get(header::LOCATION).unwrap(),
                "/users/sign_in",
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_oauth_provider_is_not_found() {
        let response = get("/users/auth/myspace").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("facebook"), "Facebook");
        assert_eq!(capitalize(""), "");
    }
}
