//! Order and cart repository.
//!
//! Every cart mutation runs in one transaction: lock the order row, change
//! the line items, recompute the total, validate, and write the order back.
//! A validation failure rolls the whole thing back and comes back as
//! [`SaveOutcome::Invalid`] instead of an error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use paperback_core::{
    BookId, LineItem, OrderId, OrderItemId, OrderState, OrderViolation, Price, UserId,
    calc_total_price, validate_order, validate_quantity, validate_transition,
};

use super::RepositoryError;
use crate::models::{Book, Order, OrderDetails, OrderItem};

const ORDER_COLUMNS: &str =
    "id, user_id, state::text AS state, total_price, completed_at, created_at, updated_at";

const ITEM_SELECT: &str = r"
    SELECT i.id, i.order_id, i.book_id, b.title AS book_title, i.price, i.quantity
    FROM storefront.order_item i
    JOIN storefront.book b ON b.id = i.book_id
";

/// Result of a cart or order mutation that passed or failed validation.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The change was committed.
    Saved(Order),
    /// The change broke a rule and was rolled back.
    Invalid(Vec<OrderViolation>),
}

impl SaveOutcome {
    /// Whether the change was committed.
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    state: String,
    total_price: Decimal,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let state = row.state.parse::<OrderState>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            state,
            total_price: row.total_price,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    book_id: BookId,
    book_title: String,
    price: Decimal,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for order item {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            book_id: row.book_id,
            book_title: row.book_title,
            price,
            quantity: row.quantity,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    price: Decimal,
    quantity: i32,
}

/// Repository for orders and their line items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM storefront."order" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Get an order together with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_details(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.items(order.id).await?;

        Ok(Some(OrderDetails { order, items }))
    }

    /// List an order's line items, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "{ITEM_SELECT} WHERE i.order_id = $1 ORDER BY i.id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }

    /// Get a single line item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item(&self, id: OrderItemId) -> Result<Option<OrderItem>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderItemRow>(&format!("{ITEM_SELECT} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(OrderItem::try_from).transpose()
    }

    /// Get the user's cart without creating one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_cart(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM storefront."order" WHERE user_id = $1 AND state = 'in_progress'"#
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Get the user's cart, creating an empty one if they have none.
    ///
    /// The insert is guarded by the one-cart-per-user index, so two
    /// concurrent calls end up with the same order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn current_cart(&self, user_id: UserId) -> Result<Order, RepositoryError> {
        let inserted = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO storefront."order" (user_id, state)
            VALUES ($1, 'in_progress')
            ON CONFLICT (user_id) WHERE state = 'in_progress' DO NOTHING
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = inserted {
            tracing::debug!(user_id = %user_id, order_id = %row.id, "Created cart");
            return Order::try_from(row);
        }

        self.find_cart(user_id)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption(format!("cart for user {user_id} vanished")))
    }

    /// List a user's orders in one state, most recently placed first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_state(
        &self,
        user_id: UserId,
        state: OrderState,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM storefront."order"
            WHERE user_id = $1 AND state = $2::storefront.order_state
            ORDER BY completed_at DESC NULLS LAST, id DESC
            "#
        ))
        .bind(user_id)
        .bind(state.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// The user's most recently placed order still waiting in the queue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn last_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .list_by_state(user_id, OrderState::InQueue)
            .await?
            .into_iter()
            .next())
    }

    // =========================================================================
    // Cart mutations
    // =========================================================================

    /// Add one copy of `book` to a cart.
    ///
    /// Line items are keyed by (order, book, price): an existing item at the
    /// book's current price is incremented, otherwise a new item starts at
    /// quantity 1. The total is recomputed in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add_book(&self, order_id: OrderId, book: &Book) -> Result<SaveOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;

        if order.state != OrderState::InProgress {
            return Ok(SaveOutcome::Invalid(vec![OrderViolation::NotEditable]));
        }

        sqlx::query(
            r"
            INSERT INTO storefront.order_item AS oi (order_id, book_id, price, quantity)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (order_id, book_id, price)
            DO UPDATE SET quantity = oi.quantity + 1, updated_at = now()
            ",
        )
        .bind(order_id)
        .bind(book.id)
        .bind(book.price.amount())
        .execute(&mut *tx)
        .await?;

        let outcome = save_with_total(&mut tx, &order, order.state, order.completed_at).await?;
        finish(tx, outcome).await
    }

    /// Set a line item's quantity, checked against the book's stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_item_quantity(
        &self,
        item_id: OrderItemId,
        quantity: i32,
        stock: i32,
    ) -> Result<SaveOutcome, RepositoryError> {
        if let Err(violation) = validate_quantity(quantity, stock) {
            return Ok(SaveOutcome::Invalid(vec![violation]));
        }

        let mut tx = self.pool.begin().await?;
        let order_id = item_order_id(&mut tx, item_id).await?;
        let order = lock_order(&mut tx, order_id).await?;

        if order.state != OrderState::InProgress {
            return Ok(SaveOutcome::Invalid(vec![OrderViolation::NotEditable]));
        }

        sqlx::query(
            "UPDATE storefront.order_item SET quantity = $2, updated_at = now() WHERE id = $1",
        )
        .bind(item_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        let outcome = save_with_total(&mut tx, &order, order.state, order.completed_at).await?;
        finish(tx, outcome).await
    }

    /// Delete a line item and recompute its order's total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove_item(&self, item_id: OrderItemId) -> Result<SaveOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let order_id = item_order_id(&mut tx, item_id).await?;
        let order = lock_order(&mut tx, order_id).await?;

        if order.state != OrderState::InProgress {
            return Ok(SaveOutcome::Invalid(vec![OrderViolation::NotEditable]));
        }

        sqlx::query("DELETE FROM storefront.order_item WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        let outcome = save_with_total(&mut tx, &order, order.state, order.completed_at).await?;
        finish(tx, outcome).await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Move an order to another state.
    ///
    /// Leaving `in_progress` stamps `completed_at`. The total is recomputed
    /// and the order validated for its new state, so an empty cart cannot be
    /// placed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn transition(
        &self,
        order_id: OrderId,
        to: OrderState,
    ) -> Result<SaveOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;

        if let Err(violation) = validate_transition(order.state, to) {
            return Ok(SaveOutcome::Invalid(vec![violation]));
        }

        let completed_at = if order.state == OrderState::InProgress {
            Some(Utc::now())
        } else {
            order.completed_at
        };

        let outcome = save_with_total(&mut tx, &order, to, completed_at).await?;
        if let SaveOutcome::Saved(saved) = &outcome {
            tracing::info!(
                order_id = %saved.id,
                from = %order.state,
                to = %saved.state,
                "Order state changed"
            );
        }
        finish(tx, outcome).await
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

/// Lock an order row for the rest of the transaction.
async fn lock_order(conn: &mut PgConnection, id: OrderId) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"SELECT {ORDER_COLUMNS} FROM storefront."order" WHERE id = $1 FOR UPDATE"#
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Order::try_from(row)
}

/// Find the order a line item belongs to.
async fn item_order_id(conn: &mut PgConnection, item_id: OrderItemId) -> Result<OrderId, RepositoryError> {
    sqlx::query_scalar::<_, OrderId>("SELECT order_id FROM storefront.order_item WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)
}

/// Recompute the total from the current items, validate, and write the order.
async fn save_with_total(
    conn: &mut PgConnection,
    order: &Order,
    state: OrderState,
    completed_at: Option<DateTime<Utc>>,
) -> Result<SaveOutcome, RepositoryError> {
    let rows = sqlx::query_as::<_, LineItemRow>(
        "SELECT price, quantity FROM storefront.order_item WHERE order_id = $1",
    )
    .bind(order.id)
    .fetch_all(&mut *conn)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| {
            let price = Price::new(row.price).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid line item price: {e}"))
            })?;
            Ok(LineItem {
                price,
                quantity: row.quantity,
            })
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;

    let total_price = calc_total_price(&items);

    if let Err(violations) = validate_order(state, total_price, completed_at) {
        return Ok(SaveOutcome::Invalid(violations));
    }

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        UPDATE storefront."order"
        SET state = $2::storefront.order_state, total_price = $3, completed_at = $4, updated_at = now()
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(order.id)
    .bind(state.as_str())
    .bind(total_price)
    .bind(completed_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(SaveOutcome::Saved(Order::try_from(row)?))
}

/// Commit a saved outcome; an invalid one rolls back when `tx` drops.
async fn finish(
    tx: sqlx::Transaction<'_, sqlx::Postgres>,
    outcome: SaveOutcome,
) -> Result<SaveOutcome, RepositoryError> {
    match outcome {
        SaveOutcome::Saved(_) => tx.commit().await?,
        SaveOutcome::Invalid(_) => tx.rollback().await?,
    }
    Ok(outcome)
}
