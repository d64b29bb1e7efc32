use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use pedidos_core::{
    CoreError, CoreResult, InventoryItem, MovementRecord, NewMovement, NewOrder, Order, OrderId,
    OrderStatus, Store, StoreTransaction,
};

/// In-process store with the same locking contract as `PgStore`.
///
/// Each order id and each product name has its own async row lock. A
/// transaction keeps the guards it acquired and stages its writes; `commit`
/// applies them under the table lock before releasing the rows.
///
/// Row locks are created on first use and kept for the life of the store,
/// one per order id and product ever locked.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    tables: RwLock<Tables>,
    order_locks: DashMap<OrderId, Arc<Mutex<()>>>,
    product_locks: DashMap<String, Arc<Mutex<()>>>,
    order_seq: AtomicI64,
    movement_seq: AtomicI64,
}

#[derive(Default)]
struct Tables {
    orders: BTreeMap<OrderId, Order>,
    inventory: BTreeMap<String, i32>,
    movements: Vec<MovementRecord>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum RowKey {
    Order(OrderId),
    Product(String),
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> CoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            held: HashSet::new(),
            guards: Vec::new(),
            inventory: HashMap::new(),
            statuses: HashMap::new(),
            movements: Vec::new(),
        }))
    }

    async fn create_order(&self, order: &NewOrder) -> CoreResult<Order> {
        let id = self.inner.order_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Order {
            id,
            client: order.client.clone(),
            product: order.product.clone(),
            quantity: order.quantity,
            supplier: order.supplier_or_empty().to_string(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        self.inner.tables.write().await.orders.insert(id, created.clone());
        Ok(created)
    }

    async fn get_order(&self, id: OrderId) -> CoreResult<Option<Order>> {
        Ok(self.inner.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> CoreResult<Vec<Order>> {
        let tables = self.inner.tables.read().await;
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn list_inventory(&self) -> CoreResult<Vec<InventoryItem>> {
        let tables = self.inner.tables.read().await;
        Ok(tables
            .inventory
            .iter()
            .map(|(product, quantity)| InventoryItem {
                product: product.clone(),
                quantity: *quantity,
            })
            .collect())
    }

    async fn list_movements(&self) -> CoreResult<Vec<MovementRecord>> {
        let tables = self.inner.tables.read().await;
        let mut movements = tables.movements.clone();
        movements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(movements)
    }

    async fn ping(&self) -> CoreResult<DateTime<Utc>> {
        Ok(Utc::now())
    }
}

pub struct MemoryTransaction {
    inner: Arc<Inner>,
    held: HashSet<RowKey>,
    guards: Vec<OwnedMutexGuard<()>>,
    inventory: HashMap<String, i32>,
    statuses: HashMap<OrderId, OrderStatus>,
    movements: Vec<MovementRecord>,
}

impl MemoryTransaction {
    /// Blocks until the row lock is ours. Re-locking a held row is a no-op,
    /// as with `FOR UPDATE` inside one Postgres transaction.
    async fn acquire(&mut self, key: RowKey) {
        if self.held.contains(&key) {
            return;
        }
        let lock = match &key {
            RowKey::Order(id) => Arc::clone(&*self.inner.order_locks.entry(*id).or_default()),
            RowKey::Product(name) => {
                Arc::clone(&*self.inner.product_locks.entry(name.clone()).or_default())
            }
        };
        self.guards.push(lock.lock_owned().await);
        self.held.insert(key);
    }

    async fn current_order(&self, id: OrderId) -> Option<Order> {
        let mut order = self.inner.tables.read().await.orders.get(&id).cloned()?;
        if let Some(status) = self.statuses.get(&id) {
            order.status = status.clone();
        }
        Some(order)
    }

    async fn current_quantity(&self, product: &str) -> Option<i32> {
        if let Some(quantity) = self.inventory.get(product) {
            return Some(*quantity);
        }
        self.inner.tables.read().await.inventory.get(product).copied()
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_order(&mut self, id: OrderId) -> CoreResult<Option<Order>> {
        self.acquire(RowKey::Order(id)).await;
        Ok(self.current_order(id).await)
    }

    async fn lock_inventory(&mut self, product: &str) -> CoreResult<Option<InventoryItem>> {
        self.acquire(RowKey::Product(product.to_string())).await;
        Ok(self.current_quantity(product).await.map(|quantity| InventoryItem {
            product: product.to_string(),
            quantity,
        }))
    }

    async fn debit_inventory(&mut self, product: &str, quantity: i32) -> CoreResult<InventoryItem> {
        self.acquire(RowKey::Product(product.to_string())).await;
        let current = self
            .current_quantity(product)
            .await
            .ok_or_else(|| CoreError::store(format!("no inventory row for {}", product)))?;
        let remaining = current
            .checked_sub(quantity)
            .filter(|q| *q >= 0)
            .ok_or_else(|| {
                CoreError::store(format!("inventory of {} would become negative", product))
            })?;
        self.inventory.insert(product.to_string(), remaining);
        Ok(InventoryItem {
            product: product.to_string(),
            quantity: remaining,
        })
    }

    async fn credit_inventory(&mut self, product: &str, quantity: i32) -> CoreResult<InventoryItem> {
        self.acquire(RowKey::Product(product.to_string())).await;
        let current = self.current_quantity(product).await.unwrap_or(0);
        let total = current
            .checked_add(quantity)
            .ok_or_else(|| CoreError::store(format!("inventory of {} overflows", product)))?;
        self.inventory.insert(product.to_string(), total);
        Ok(InventoryItem {
            product: product.to_string(),
            quantity: total,
        })
    }

    async fn append_movement(&mut self, movement: &NewMovement) -> CoreResult<MovementRecord> {
        // Like a sequence, ids are not reused after a rollback.
        let id = self.inner.movement_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let record = MovementRecord {
            id,
            product: movement.product.clone(),
            quantity: movement.quantity,
            kind: movement.kind,
            reference: movement.reference.clone(),
            created_at: Utc::now(),
        };
        self.movements.push(record.clone());
        Ok(record)
    }

    async fn set_order_status(&mut self, id: OrderId, status: &OrderStatus) -> CoreResult<Order> {
        self.acquire(RowKey::Order(id)).await;
        let mut order = self.current_order(id).await.ok_or(CoreError::NotFound(id))?;
        order.status = status.clone();
        self.statuses.insert(id, status.clone());
        Ok(order)
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let this = *self;
        {
            let mut tables = this.inner.tables.write().await;
            for (product, quantity) in this.inventory {
                tables.inventory.insert(product, quantity);
            }
            for (id, status) in this.statuses {
                if let Some(order) = tables.orders.get_mut(&id) {
                    order.status = status;
                }
            }
            tables.movements.extend(this.movements);
        }
        // Row locks are released only once the writes are visible.
        drop(this.guards);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn new_order(product: &str, quantity: i32) -> NewOrder {
        NewOrder {
            client: "Juan".to_string(),
            product: product.to_string(),
            quantity,
            supplier: Some("XYZ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_staged_writes() {
        let store = MemoryStore::new();
        let order = store.create_order(&new_order("Broca", 5)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.credit_inventory("Broca", 10).await.unwrap();
        tx.append_movement(&NewMovement::inbound("Broca", 10, "seed")).await.unwrap();
        tx.set_order_status(order.id, &OrderStatus::Shipped).await.unwrap();

        // Not visible before commit
        assert!(store.list_inventory().await.unwrap().is_empty());
        assert_eq!(store.get_order(order.id).await.unwrap().unwrap().status, OrderStatus::Pending);

        tx.commit().await.unwrap();

        assert_eq!(
            store.list_inventory().await.unwrap(),
            vec![InventoryItem { product: "Broca".to_string(), quantity: 10 }]
        );
        assert_eq!(store.list_movements().await.unwrap().len(), 1);
        assert_eq!(store.get_order(order.id).await.unwrap().unwrap().status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.credit_inventory("Broca", 10).await.unwrap();
        tx.rollback().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.credit_inventory("Broca", 7).await.unwrap();
        }

        assert!(store.list_inventory().await.unwrap().is_empty());
        assert!(store.list_movements().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_debit_never_goes_negative() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.credit_inventory("Broca", 3).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx.debit_inventory("Broca", 5).await.unwrap_err();
        assert!(matches!(err, CoreError::StoreFailure(_)));

        let err = tx.debit_inventory("Tornillo", 1).await.unwrap_err();
        assert!(matches!(err, CoreError::StoreFailure(_)));
    }

    #[tokio::test]
    async fn test_relocking_held_row_does_not_deadlock() {
        let store = MemoryStore::new();
        let order = store.create_order(&new_order("Broca", 1)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.lock_order(order.id).await.unwrap();
        let relocked = tokio::time::timeout(Duration::from_secs(1), tx.lock_order(order.id)).await;
        assert!(relocked.is_ok());
    }

    #[tokio::test]
    async fn test_row_lock_blocks_second_transaction_until_commit() {
        let store = MemoryStore::new();
        let order = store.create_order(&new_order("Broca", 1)).await.unwrap();

        let mut first = store.begin().await.unwrap();
        first.lock_order(order.id).await.unwrap();

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut second = store.begin().await.unwrap();
                let seen = second.lock_order(order.id).await.unwrap().unwrap();
                second.rollback().await.unwrap();
                seen.status
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        first.set_order_status(order.id, &OrderStatus::Shipped).await.unwrap();
        first.commit().await.unwrap();

        assert_eq!(contender.await.unwrap(), OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_listing_order() {
        let store = MemoryStore::new();
        let first = store.create_order(&new_order("Broca", 1)).await.unwrap();
        let second = store.create_order(&new_order("Alicate", 2)).await.unwrap();

        let ids: Vec<OrderId> = store.list_orders().await.unwrap().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let mut tx = store.begin().await.unwrap();
        tx.credit_inventory("Tornillo", 1).await.unwrap();
        tx.credit_inventory("Alicate", 1).await.unwrap();
        tx.commit().await.unwrap();

        let products: Vec<String> = store
            .list_inventory()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.product)
            .collect();
        assert_eq!(products, vec!["Alicate".to_string(), "Tornillo".to_string()]);
    }
}
