pub mod stock;

pub use stock::{StockIn, StockService, DEFAULT_STOCK_IN_REFERENCE};
