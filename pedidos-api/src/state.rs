use std::sync::Arc;

use pedidos_core::Store;
use pedidos_inventory::StockService;
use pedidos_order::{OrderFulfillment, OrderManager};
use pedidos_store::app_config::AuthConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub orders: OrderManager,
    pub fulfillment: OrderFulfillment,
    pub stock: StockService,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, strict_statuses: bool, auth: AuthConfig) -> Self {
        Self {
            orders: OrderManager::new(store.clone()),
            fulfillment: OrderFulfillment::new(store.clone()).with_strict_statuses(strict_statuses),
            stock: StockService::new(store.clone()),
            store,
            auth,
        }
    }
}
