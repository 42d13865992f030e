//! Order history handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use paperback_core::{OrderId, OrderState};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{Order, OrderItem};
use crate::policy::authorize_order;
use crate::state::AppState;

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub ctx: PageContext,
    pub cart: Option<Order>,
    pub in_queue: Vec<Order>,
    pub in_delivery: Vec<Order>,
    pub delivered: Vec<Order>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub ctx: PageContext,
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub editable: bool,
}

/// The cart plus orders grouped by state.
///
/// # Route
///
/// `GET /orders`
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool());

    Ok(OrdersIndexTemplate {
        ctx,
        cart: orders.find_cart(user.id).await?,
        in_queue: orders.list_by_state(user.id, OrderState::InQueue).await?,
        in_delivery: orders.list_by_state(user.id, OrderState::InDelivery).await?,
        delivered: orders.list_by_state(user.id, OrderState::Delivered).await?,
    })
}

/// Show one of the user's orders.
///
/// # Route
///
/// `GET /orders/{id}`
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let details = OrderRepository::new(state.pool())
        .get_details(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    authorize_order(&user, &details.order)?;

    let editable = details.order.is_cart();
    Ok(OrderShowTemplate {
        ctx,
        order: details.order,
        items: details.items,
        editable,
    })
}
