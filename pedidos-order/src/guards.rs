use pedidos_core::{CoreError, CoreResult, MovementRecord, NewMovement, Order, OrderStatus, StoreTransaction};
use tracing::warn;

/// Side conditions attached to a status change.
///
/// Guards run inside the transaction that changes the status, after the
/// order row is locked, so any row they lock comes second in lock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionGuard {
    /// Pending → Shipped: debit the order's quantity from stock and record
    /// the outbound movement.
    ReserveStock,
    Unguarded,
}

impl TransitionGuard {
    pub fn for_transition(from: &OrderStatus, to: &OrderStatus) -> Self {
        match (from, to) {
            (OrderStatus::Pending, OrderStatus::Shipped) => TransitionGuard::ReserveStock,
            _ => TransitionGuard::Unguarded,
        }
    }

    /// Returns the ledger entry written by the guard, if any.
    pub async fn enforce(
        self,
        tx: &mut dyn StoreTransaction,
        order: &Order,
    ) -> CoreResult<Option<MovementRecord>> {
        match self {
            TransitionGuard::Unguarded => Ok(None),
            TransitionGuard::ReserveStock => reserve_stock(tx, order).await.map(Some),
        }
    }
}

async fn reserve_stock(tx: &mut dyn StoreTransaction, order: &Order) -> CoreResult<MovementRecord> {
    let available = tx
        .lock_inventory(&order.product)
        .await?
        .map(|item| item.quantity)
        .unwrap_or(0);

    if available < order.quantity {
        warn!(
            "Order #{} needs {} of {}, only {} in stock",
            order.id, order.quantity, order.product, available
        );
        return Err(CoreError::InsufficientStock {
            product: order.product.clone(),
            available,
            required: order.quantity,
        });
    }

    tx.debit_inventory(&order.product, order.quantity).await?;
    tx.append_movement(&NewMovement::outbound_for(order)).await
}
