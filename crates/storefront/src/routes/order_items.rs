//! Cart line item handlers.
//!
//! Every change recomputes the order total in the same transaction. Save
//! failures come back as [`SaveOutcome::Invalid`] and become flash messages.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use paperback_core::{BookId, OrderItemId, OrderViolation};

use crate::db::{BookRepository, OrderRepository, SaveOutcome};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{FlashLevel, RequireAuth, push_flash};
use crate::models::{CurrentUser, Order, OrderItem};
use crate::policy::authorize_order_item;
use crate::state::AppState;

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct CreateOrderItemForm {
    pub book_id: BookId,
}

/// Quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderItemForm {
    /// Echo of the path ID, when the form sends one.
    pub id: Option<OrderItemId>,
    /// Raw field text, so a blank or non-numeric value reaches the handler.
    pub quantity: String,
}

/// Parse the quantity field. Anything that is not an integer counts as
/// below one.
fn parse_quantity(raw: &str) -> std::result::Result<i32, OrderViolation> {
    raw.trim()
        .parse()
        .map_err(|_| OrderViolation::QuantityBelowOne)
}

/// Load a line item and its order, checking ownership.
async fn load_authorized(
    orders: &OrderRepository<'_>,
    user: &CurrentUser,
    id: OrderItemId,
) -> Result<(OrderItem, Order)> {
    let item = orders
        .get_item(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order item {id}")))?;
    let order = orders
        .get_by_id(item.order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", item.order_id)))?;

    authorize_order_item(user, &item, &order)?;
    Ok((item, order))
}

/// Add a book to the cart.
///
/// # Route
///
/// `POST /order_items`
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CreateOrderItemForm>,
) -> Result<Redirect> {
    let book = BookRepository::new(state.pool())
        .get_by_id(form.book_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("book {}", form.book_id)))?;

    let orders = OrderRepository::new(state.pool());
    let cart = orders.current_cart(user.id).await?;

    match orders.add_book(cart.id, &book).await? {
        SaveOutcome::Saved(order) => {
            tracing::info!(order_id = %order.id, book_id = %book.id, total = %order.total_price, "Book added to cart");
            let book_id = book.id.to_string();
            add_breadcrumb("cart", "Added book", Some(&[("book_id", book_id.as_str())]));
            push_flash(
                &session,
                FlashLevel::Success,
                "The book successfully added to the Cart.",
            )
            .await?;
        }
        SaveOutcome::Invalid(violations) => {
            tracing::warn!(order_id = %cart.id, book_id = %book.id, ?violations, "Could not add book to cart");
            push_flash(&session, FlashLevel::Danger, "We have some problems.").await?;
        }
    }

    Ok(Redirect::to("/cart"))
}

/// Change a line item's quantity.
///
/// # Route
///
/// `PATCH /order_items/{id}` (or `POST` from forms)
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderItemId>,
    Form(form): Form<UpdateOrderItemForm>,
) -> Result<Redirect> {
    if form.id.is_some_and(|form_id| form_id != id) {
        return Err(AppError::BadRequest("order item id mismatch".to_string()));
    }

    let orders = OrderRepository::new(state.pool());
    let (item, _order) = load_authorized(&orders, &user, id).await?;

    let book = BookRepository::new(state.pool())
        .get_by_id(item.book_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("book {}", item.book_id)))?;

    let outcome = match parse_quantity(&form.quantity) {
        Ok(quantity) => {
            orders
                .update_item_quantity(item.id, quantity, book.stock)
                .await?
        }
        Err(violation) => SaveOutcome::Invalid(vec![violation]),
    };

    match outcome {
        SaveOutcome::Saved(order) => {
            tracing::info!(order_id = %order.id, item_id = %item.id, quantity = %form.quantity, "Cart quantity updated");
            push_flash(&session, FlashLevel::Info, "The Cart successfully updated.").await?;
        }
        SaveOutcome::Invalid(violations) => {
            tracing::warn!(item_id = %item.id, quantity = %form.quantity, ?violations, "Cart quantity rejected");
            push_flash(
                &session,
                FlashLevel::Warning,
                "Sorry, this book is not present in stock.",
            )
            .await?;
        }
    }

    Ok(Redirect::to("/cart"))
}

/// Remove a line item from the cart.
///
/// # Route
///
/// `DELETE /order_items/{id}` (or `POST /order_items/{id}/delete` from forms)
#[instrument(skip_all)]
pub async fn destroy(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderItemId>,
) -> Result<Redirect> {
    let orders = OrderRepository::new(state.pool());
    let (item, _order) = load_authorized(&orders, &user, id).await?;

    match orders.remove_item(item.id).await? {
        SaveOutcome::Saved(order) => {
            tracing::info!(order_id = %order.id, item_id = %item.id, total = %order.total_price, "Book removed from cart");
        }
        SaveOutcome::Invalid(violations) => {
            tracing::warn!(item_id = %item.id, ?violations, "Could not remove book from cart");
        }
    }

    push_flash(
        &session,
        FlashLevel::Warning,
        "The book successfully removed from shopping cart.",
    )
    .await?;

    Ok(Redirect::to("/cart"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3"), Ok(3));
        assert_eq!(parse_quantity(" 2 "), Ok(2));
        assert_eq!(parse_quantity(""), Err(OrderViolation::QuantityBelowOne));
        assert_eq!(parse_quantity("two"), Err(OrderViolation::QuantityBelowOne));
        assert_eq!(parse_quantity("1.5"), Err(OrderViolation::QuantityBelowOne));
    }

    #[tokio::test]
    async fn test_non_numeric_quantity_reaches_handler() {
        use axum::{
            body::Body,
            extract::FromRequest,
            http::{Request, header},
        };

        for body in ["quantity=", "quantity=abc"] {
            let request = Request::builder()
                .method("POST")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap();
            let Form(form) = Form::<UpdateOrderItemForm>::from_request(request, &())
                .await
                .unwrap();
            assert!(form.id.is_none());
            assert_eq!(parse_quantity(&form.quantity), Err(OrderViolation::QuantityBelowOne));
        }
    }
}
