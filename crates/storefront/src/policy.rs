//! Authorization rules for order resources.
//!
//! Handlers load the resource, then call the matching check before acting.
//! A denial surfaces as [`crate::error::AppError::AccessDenied`].

use thiserror::Error;

use crate::models::{CurrentUser, Order, OrderItem};

/// The signed-in user may not touch this resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("You are not authorized to access this page.")]
pub struct AccessDenied;

/// Users may only see and change their own orders.
///
/// # Errors
///
/// Returns [`AccessDenied`] if `order` belongs to someone else.
pub fn authorize_order(user: &CurrentUser, order: &Order) -> Result<(), AccessDenied> {
    if order.user_id == user.id {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}

/// Users may only change line items of their own orders.
///
/// `order` must be the item's parent.
///
/// # Errors
///
/// Returns [`AccessDenied`] if the item is not in `order` or `order` belongs
/// to someone else.
pub fn authorize_order_item(
    user: &CurrentUser,
    item: &OrderItem,
    order: &Order,
) -> Result<(), AccessDenied> {
    if item.order_id != order.id {
        return Err(AccessDenied);
    }
    authorize_order(user, order)
}
