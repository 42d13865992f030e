//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use paperback_core::{
    BookId, LineItem, OrderId, OrderItemId, OrderState, Price, UserId, format_amount,
};

/// An order (domain type). The `in_progress` order is the user's cart.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub state: OrderState,
    /// Sum of the line items, recomputed after every cart change.
    pub total_price: Decimal,
    /// Set when the order leaves the cart.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Display form of the total, e.g. `$9.99`.
    #[must_use]
    pub fn total(&self) -> String {
        format_amount(self.total_price)
    }

    /// Whether line items may still change.
    #[must_use]
    pub fn is_cart(&self) -> bool {
        self.state == OrderState::InProgress
    }
}

/// One (book, price, quantity) line of an order.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub book_id: BookId,
    /// Title of the book, joined for display.
    pub book_title: String,
    /// Unit price captured when the book was added.
    pub price: Price,
    pub quantity: i32,
}

impl OrderItem {
    /// The price/quantity pair used for total calculation.
    #[must_use]
    pub const fn line_item(&self) -> LineItem {
        LineItem {
            price: self.price,
            quantity: self.quantity,
        }
    }

    /// Display form of price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> String {
        format_amount(self.line_item().subtotal())
    }
}

/// An order together with its line items.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetails {
    /// Total number of copies across all lines.
    #[must_use]
    pub fn item_count(&self) -> i32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
