use std::sync::Arc;

use pedidos_core::{settle, CoreError, CoreResult, Order, OrderId, OrderStatus, Store, StoreTransaction};
use tracing::{debug, info};

use crate::guards::TransitionGuard;

/// Moves orders between statuses, debiting stock when an order ships.
///
/// Every call runs as one store transaction: the order row is locked first,
/// the guard for the transition runs next, then the status is written. On
/// any error nothing is persisted.
#[derive(Clone)]
pub struct OrderFulfillment {
    store: Arc<dyn Store>,
    strict_statuses: bool,
}

impl OrderFulfillment {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            strict_statuses: false,
        }
    }

    /// When set, only the named statuses are accepted as transition targets.
    pub fn with_strict_statuses(mut self, strict: bool) -> Self {
        self.strict_statuses = strict;
        self
    }

    pub async fn transition(&self, order_id: OrderId, new_status: &str) -> CoreResult<Order> {
        let new_status = self.parse_status(new_status)?;

        let mut tx = self.store.begin().await?;
        let result = apply_transition(tx.as_mut(), order_id, &new_status).await;
        let order = settle(tx, result).await?;

        info!("Order #{} is now {}", order.id, order.status);
        Ok(order)
    }

    fn parse_status(&self, raw: &str) -> CoreResult<OrderStatus> {
        let status: OrderStatus = raw.parse()?;
        if self.strict_statuses && !status.is_known() {
            return Err(CoreError::validation(format!("unknown order status: {}", status)));
        }
        Ok(status)
    }
}

async fn apply_transition(
    tx: &mut dyn StoreTransaction,
    order_id: OrderId,
    new_status: &OrderStatus,
) -> CoreResult<Order> {
    let order = tx
        .lock_order(order_id)
        .await?
        .ok_or(CoreError::NotFound(order_id))?;

    let guard = TransitionGuard::for_transition(&order.status, new_status);
    if let Some(movement) = guard.enforce(tx, &order).await? {
        debug!(
            "Debited {} x{} for order #{} (movement {})",
            movement.product, movement.quantity, order.id, movement.id
        );
    }

    tx.set_order_status(order.id, new_status).await
}
