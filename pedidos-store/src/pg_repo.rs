use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use pedidos_core::{
    CoreError, CoreResult, InventoryItem, MovementRecord, NewMovement, NewOrder, Order, OrderId,
    OrderStatus, Store, StoreTransaction,
};

use crate::database::DbClient;

const ORDER_COLUMNS: &str = "id, client, product, quantity, supplier, status, created_at";
const MOVEMENT_COLUMNS: &str = "id, product, quantity, kind, reference, created_at";

/// Postgres-backed store. Every transaction holds one pooled connection.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<&DbClient> for PgStore {
    fn from(db: &DbClient) -> Self {
        Self::new(db.pool.clone())
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    client: String,
    product: String,
    quantity: i32,
    supplier: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = CoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            client: row.client,
            product: row.product,
            quantity: row.quantity,
            supplier: row.supplier,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InventoryRow {
    product: String,
    quantity: i32,
}

impl From<InventoryRow> for InventoryItem {
    fn from(row: InventoryRow) -> Self {
        InventoryItem {
            product: row.product,
            quantity: row.quantity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MovementRow {
    id: i64,
    product: String,
    quantity: i32,
    kind: String,
    reference: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for MovementRecord {
    type Error = CoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(MovementRecord {
            id: row.id,
            product: row.product,
            quantity: row.quantity,
            kind: row.kind.parse()?,
            reference: row.reference,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> CoreResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.map_err(CoreError::store)?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn create_order(&self, order: &NewOrder) -> CoreResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (client, product, quantity, supplier, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(&order.client)
        .bind(&order.product)
        .bind(order.quantity)
        .bind(order.supplier_or_empty())
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(CoreError::store)?;

        row.try_into()
    }

    async fn get_order(&self, id: OrderId) -> CoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::store)?;

        row.map(Order::try_from).transpose()
    }

    async fn list_orders(&self) -> CoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders ORDER BY created_at DESC, id DESC",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::store)?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn list_inventory(&self) -> CoreResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            "SELECT product, quantity FROM inventory ORDER BY product",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::store)?;

        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    async fn list_movements(&self) -> CoreResult<Vec<MovementRecord>> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {} FROM inventory_movements ORDER BY created_at DESC, id DESC",
            MOVEMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::store)?;

        rows.into_iter().map(MovementRecord::try_from).collect()
    }

    async fn ping(&self) -> CoreResult<DateTime<Utc>> {
        sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()")
            .fetch_one(&self.pool)
            .await
            .map_err(CoreError::store)
    }
}

pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn lock_order(&mut self, id: OrderId) -> CoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1 FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(CoreError::store)?;

        row.map(Order::try_from).transpose()
    }

    async fn lock_inventory(&mut self, product: &str) -> CoreResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, InventoryRow>(
            "SELECT product, quantity FROM inventory WHERE product = $1 FOR UPDATE",
        )
        .bind(product)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(CoreError::store)?;

        Ok(row.map(InventoryItem::from))
    }

    async fn debit_inventory(&mut self, product: &str, quantity: i32) -> CoreResult<InventoryItem> {
        // The CHECK (quantity >= 0) constraint backs up the caller's guard.
        let row = sqlx::query_as::<_, InventoryRow>(
            "UPDATE inventory SET quantity = quantity - $1 WHERE product = $2 RETURNING product, quantity",
        )
        .bind(quantity)
        .bind(product)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(CoreError::store)?;

        row.map(InventoryItem::from)
            .ok_or_else(|| CoreError::store(format!("no inventory row for {}", product)))
    }

    async fn credit_inventory(&mut self, product: &str, quantity: i32) -> CoreResult<InventoryItem> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            INSERT INTO inventory (product, quantity) VALUES ($1, $2)
            ON CONFLICT (product) DO UPDATE SET quantity = inventory.quantity + EXCLUDED.quantity
            RETURNING product, quantity
            "#,
        )
        .bind(product)
        .bind(quantity)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(CoreError::store)?;

        Ok(row.into())
    }

    async fn append_movement(&mut self, movement: &NewMovement) -> CoreResult<MovementRecord> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "INSERT INTO inventory_movements (product, quantity, kind, reference) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            MOVEMENT_COLUMNS
        ))
        .bind(&movement.product)
        .bind(movement.quantity)
        .bind(movement.kind.as_str())
        .bind(&movement.reference)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(CoreError::store)?;

        row.try_into()
    }

    async fn set_order_status(&mut self, id: OrderId, status: &OrderStatus) -> CoreResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $1 WHERE id = $2 RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(CoreError::store)?;

        row.map(Order::try_from)
            .transpose()?
            .ok_or(CoreError::NotFound(id))
    }

    async fn commit(self: Box<Self>) -> CoreResult<()> {
        self.tx.commit().await.map_err(CoreError::store)
    }

    async fn rollback(self: Box<Self>) -> CoreResult<()> {
        self.tx.rollback().await.map_err(CoreError::store)
    }
}
