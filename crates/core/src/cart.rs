//! Cart arithmetic and order validation.
//!
//! These rules run inside the storefront's cart transactions, after the line
//! items have been mutated and before the order row is written back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderState, Price};

/// A priced quantity of one book in an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Unit price captured when the book was added.
    pub price: Price,
    /// Number of copies.
    pub quantity: i32,
}

impl LineItem {
    /// Price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price.amount() * Decimal::from(self.quantity)
    }
}

/// A rule an order or line item breaks.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderViolation {
    /// The total is negative.
    #[error("total price must be greater than or equal to 0")]
    NegativeTotal,
    /// A placed order has a total under one cent.
    #[error("total price must be greater than or equal to {min}", min = Price::MIN)]
    TotalBelowMinimum,
    /// A placed order has no completion time.
    #[error("completed at can't be blank")]
    MissingCompletedAt,
    /// The order is no longer a cart, so its items cannot change.
    #[error("order is no longer editable")]
    NotEditable,
    /// The requested state change is not allowed.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: OrderState,
        /// Requested state.
        to: OrderState,
    },
    /// A line item quantity is zero or negative.
    #[error("quantity must be greater than or equal to 1")]
    QuantityBelowOne,
    /// A line item asks for more copies than are in stock.
    #[error("quantity must be less than or equal to {stock}")]
    QuantityExceedsStock {
        /// Copies available.
        stock: i32,
    },
}

/// Sum of price times quantity over `items`.
///
/// Recomputes from scratch every time, so calling it twice on the same items
/// gives the same total.
#[must_use]
pub fn calc_total_price<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Decimal {
    items.into_iter().map(LineItem::subtotal).sum()
}

/// Check an order's total and completion time against its state.
///
/// A cart (`in_progress`) may be empty and is not completed yet. Any other
/// state means the order was placed, so it needs a positive total and a
/// `completed_at` stamp.
///
/// # Errors
///
/// Returns every [`OrderViolation`] the order breaks.
pub fn validate_order(
    state: OrderState,
    total_price: Decimal,
    completed_at: Option<DateTime<Utc>>,
) -> Result<(), Vec<OrderViolation>> {
    let mut violations = Vec::new();

    if total_price < Decimal::ZERO {
        violations.push(OrderViolation::NegativeTotal);
    }

    if state != OrderState::InProgress {
        if total_price >= Decimal::ZERO && total_price < Price::MIN {
            violations.push(OrderViolation::TotalBelowMinimum);
        }
        if completed_at.is_none() {
            violations.push(OrderViolation::MissingCompletedAt);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Check that an order may move from `from` to `to`.
///
/// # Errors
///
/// Returns [`OrderViolation::InvalidTransition`] for a move the lifecycle
/// does not allow.
pub const fn validate_transition(from: OrderState, to: OrderState) -> Result<(), OrderViolation> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(OrderViolation::InvalidTransition { from, to })
    }
}

/// Check a requested line item quantity against the book's stock.
///
/// # Errors
///
/// Returns [`OrderViolation::QuantityBelowOne`] or
/// [`OrderViolation::QuantityExceedsStock`].
pub const fn validate_quantity(quantity: i32, stock: i32) -> Result<(), OrderViolation> {
    if quantity < 1 {
        return Err(OrderViolation::QuantityBelowOne);
    }
    if quantity > stock {
        return Err(OrderViolation::QuantityExceedsStock { stock });
    }
    Ok(())
}
