use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::error;

use crate::models::{InventoryItem, MovementRecord, NewMovement, NewOrder, Order, OrderId, OrderStatus};
use crate::CoreResult;

/// Handle on the backing store. Implementations are cheap to share behind
/// an `Arc` and hand out one transaction (one connection) per call to `begin`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> CoreResult<Box<dyn StoreTransaction>>;

    /// Inserts a new order with status `Pending`.
    async fn create_order(&self, order: &NewOrder) -> CoreResult<Order>;

    async fn get_order(&self, id: OrderId) -> CoreResult<Option<Order>>;

    /// Newest-created first.
    async fn list_orders(&self) -> CoreResult<Vec<Order>>;

    /// Ordered by product name.
    async fn list_inventory(&self) -> CoreResult<Vec<InventoryItem>>;

    /// Newest first.
    async fn list_movements(&self) -> CoreResult<Vec<MovementRecord>>;

    /// Round-trips to the store and reports its clock.
    async fn ping(&self) -> CoreResult<DateTime<Utc>>;
}

/// An open all-or-nothing unit of work.
///
/// Row locks taken through `lock_order` / `lock_inventory` are held until
/// `commit` or `rollback`. Dropping a transaction without committing discards
/// its writes. Callers must lock the order row before any inventory row.
#[async_trait]
pub trait StoreTransaction: Send {
    /// `SELECT ... FOR UPDATE` on the order row.
    async fn lock_order(&mut self, id: OrderId) -> CoreResult<Option<Order>>;

    /// `SELECT ... FOR UPDATE` on the inventory row of `product`.
    async fn lock_inventory(&mut self, product: &str) -> CoreResult<Option<InventoryItem>>;

    /// Subtracts `quantity` from an existing row. Never lets the row go negative.
    async fn debit_inventory(&mut self, product: &str, quantity: i32) -> CoreResult<InventoryItem>;

    /// Adds `quantity`, creating the row when it does not exist yet.
    async fn credit_inventory(&mut self, product: &str, quantity: i32) -> CoreResult<InventoryItem>;

    async fn append_movement(&mut self, movement: &NewMovement) -> CoreResult<MovementRecord>;

    async fn set_order_status(&mut self, id: OrderId, status: &OrderStatus) -> CoreResult<Order>;

    async fn commit(self: Box<Self>) -> CoreResult<()>;

    async fn rollback(self: Box<Self>) -> CoreResult<()>;
}

/// Commits `tx` when `result` is `Ok`, rolls it back otherwise.
///
/// A failed rollback is logged and the original error is returned; the store
/// discards the transaction's writes either way.
pub async fn settle<T>(tx: Box<dyn StoreTransaction>, result: CoreResult<T>) -> CoreResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("Rollback failed after {}: {}", err, rollback_err);
            }
            Err(err)
        }
    }
}
