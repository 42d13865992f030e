//! Shopping cart handlers.
//!
//! The cart is the user's single `in_progress` order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use paperback_core::{OrderState, OrderViolation};

use crate::db::{OrderRepository, SaveOutcome};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashLevel, PageContext, RequireAuth, push_flash};
use crate::models::{Order, OrderItem};
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub ctx: PageContext,
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub editable: bool,
}

/// Show the current cart, creating it if needed.
///
/// # Route
///
/// `GET /cart`
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool());
    let cart = orders.current_cart(user.id).await?;
    let details = orders
        .get_details(cart.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", cart.id)))?;

    Ok(CartTemplate {
        ctx,
        order: details.order,
        items: details.items,
        editable: true,
    })
}

/// Place the cart as an order.
///
/// # Route
///
/// `POST /cart/checkout`
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    let orders = OrderRepository::new(state.pool());

    let Some(cart) = orders.find_cart(user.id).await? else {
        push_flash(&session, FlashLevel::Warning, "Your cart is empty.").await?;
        return Ok(Redirect::to("/cart"));
    };

    match orders.transition(cart.id, OrderState::InQueue).await? {
        SaveOutcome::Saved(order) => {
            push_flash(&session, FlashLevel::Success, "Your order has been placed.").await?;
            Ok(Redirect::to(&format!("/orders/{}", order.id)))
        }
        SaveOutcome::Invalid(violations) => {
            tracing::warn!(order_id = %cart.id, ?violations, "Checkout rejected");
            let message = if violations.contains(&OrderViolation::TotalBelowMinimum) {
                "Your cart is empty."
            } else {
                "We have some problems."
            };
            push_flash(&session, FlashLevel::Warning, message).await?;
            Ok(Redirect::to("/cart"))
        }
    }
}
