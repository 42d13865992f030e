//! Order fulfilment commands.
//!
//! The storefront only ever moves a cart to `in_queue`. Staff advance placed
//! orders from here.

use paperback_core::{OrderId, OrderState};
use paperback_storefront::db::{OrderRepository, SaveOutcome, create_pool};
use tracing::{error, info};

/// Move order `id` to the state named by `to`.
///
/// # Errors
///
/// Returns an error if the state name is unknown, the order doesn't exist,
/// the database is unreachable, or the transition is not allowed.
pub async fn advance(id: i32, to: &str) -> Result<(), Box<dyn std::error::Error>> {
    let to: OrderState = to.parse()?;
    let database_url = super::database_url()?;
    let pool = create_pool(&database_url).await?;

    let orders = OrderRepository::new(&pool);
    match orders.transition(OrderId::new(id), to).await? {
        SaveOutcome::Saved(order) => {
            info!(order_id = %order.id, state = %order.state, "Order updated");
            Ok(())
        }
        SaveOutcome::Invalid(violations) => {
            for violation in &violations {
                error!("  - {violation}");
            }
            Err(format!("order {id} was not updated").into())
        }
    }
}
