use std::sync::Arc;

use pedidos_core::{CoreError, CoreResult, NewOrder, Order, OrderId, Store};
use tracing::info;

/// Creates and reads orders. Status changes go through `OrderFulfillment`.
#[derive(Clone)]
pub struct OrderManager {
    store: Arc<dyn Store>,
}

impl OrderManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a new order; it always starts out `Pending`.
    pub async fn create_order(&self, order: NewOrder) -> CoreResult<Order> {
        let order = order.validated()?;
        let created = self.store.create_order(&order).await?;
        info!(
            "Order #{} created: {} x{} for {}",
            created.id, created.product, created.quantity, created.client
        );
        Ok(created)
    }

    pub async fn get_order(&self, order_id: OrderId) -> CoreResult<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(CoreError::NotFound(order_id))
    }

    /// All orders, newest first.
    pub async fn list_orders(&self) -> CoreResult<Vec<Order>> {
        self.store.list_orders().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedidos_core::OrderStatus;
    use pedidos_store::MemoryStore;

    fn manager() -> OrderManager {
        OrderManager::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_order_lifecycle() {
        let manager = manager();

        let order = manager
            .create_order(NewOrder {
                client: "Juan".to_string(),
                product: "Broca".to_string(),
                quantity: 5,
                supplier: Some("XYZ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.supplier, "XYZ");

        let fetched = manager.get_order(order.id).await.unwrap();
        assert_eq!(fetched, order);

        let second = manager
            .create_order(NewOrder {
                client: "Ana".to_string(),
                product: "Alicate".to_string(),
                quantity: 1,
                supplier: None,
            })
            .await
            .unwrap();

        let listed = manager.list_orders().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
    }

    #[tokio::test]
    async fn test_invalid_order_is_rejected_before_store() {
        let manager = manager();

        let result = manager
            .create_order(NewOrder {
                client: "Juan".to_string(),
                product: " ".to_string(),
                quantity: 5,
                supplier: None,
            })
            .await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
        assert!(manager.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_order() {
        let manager = manager();
        assert!(matches!(manager.get_order(42).await, Err(CoreError::NotFound(42))));
    }
}
