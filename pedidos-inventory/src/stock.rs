use serde::Deserialize;
use std::sync::Arc;

use pedidos_core::{
    settle, CoreError, CoreResult, InventoryItem, MovementRecord, NewMovement, Store, StoreTransaction,
};
use tracing::info;

pub const DEFAULT_STOCK_IN_REFERENCE: &str = "Manual stock-in";

/// A stock-in request
#[derive(Debug, Clone, Deserialize)]
pub struct StockIn {
    pub product: String,
    pub quantity: i32,
    #[serde(default)]
    pub reference: Option<String>,
}

impl StockIn {
    pub fn new(product: impl Into<String>, quantity: i32) -> Self {
        Self {
            product: product.into(),
            quantity,
            reference: None,
        }
    }

    fn validated(self) -> CoreResult<StockIn> {
        let product = self.product.trim().to_string();
        if product.is_empty() {
            return Err(CoreError::validation("product must not be empty"));
        }
        if self.quantity <= 0 {
            return Err(CoreError::validation(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        let reference = self
            .reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Ok(StockIn {
            product,
            quantity: self.quantity,
            reference,
        })
    }
}

/// Stock-in and inventory/ledger queries
#[derive(Clone)]
pub struct StockService {
    store: Arc<dyn Store>,
}

impl StockService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Adds stock for a product, creating the inventory row on first use, and
    /// records the inbound movement in the same transaction.
    pub async fn add_stock(&self, request: StockIn) -> CoreResult<InventoryItem> {
        let request = request.validated()?;

        let mut tx = self.store.begin().await?;
        let result = credit(tx.as_mut(), &request).await;
        let item = settle(tx, result).await?;

        info!(
            "{} units of {} added to inventory (now {})",
            request.quantity, item.product, item.quantity
        );
        Ok(item)
    }

    /// Ordered by product name.
    pub async fn list_inventory(&self) -> CoreResult<Vec<InventoryItem>> {
        self.store.list_inventory().await
    }

    /// Newest first.
    pub async fn list_movements(&self) -> CoreResult<Vec<MovementRecord>> {
        self.store.list_movements().await
    }
}

async fn credit(tx: &mut dyn StoreTransaction, request: &StockIn) -> CoreResult<InventoryItem> {
    tx.lock_inventory(&request.product).await?;
    let item = tx.credit_inventory(&request.product, request.quantity).await?;
    let reference = request
        .reference
        .as_deref()
        .unwrap_or(DEFAULT_STOCK_IN_REFERENCE);
    tx.append_movement(&NewMovement::inbound(&request.product, request.quantity, reference))
        .await?;
    Ok(item)
}
