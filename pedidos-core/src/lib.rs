pub mod models;
pub mod repository;

pub use models::{
    InventoryItem, MovementKind, MovementRecord, NewMovement, NewOrder, Order, OrderId, OrderStatus,
};
pub use repository::{settle, Store, StoreTransaction};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    #[error("Insufficient stock of {product}: available {available}, required {required}")]
    InsufficientStock {
        product: String,
        available: i32,
        required: i32,
    },
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Store failure: {0}")]
    StoreFailure(#[source] BoxError),
}

impl CoreError {
    /// Wraps a driver or backend error as a `StoreFailure`.
    pub fn store<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        CoreError::StoreFailure(err.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::ValidationError(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product: "Broca".to_string(),
            available: 3,
            required: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock of Broca: available 3, required 5"
        );
    }

    #[test]
    fn test_store_failure_keeps_source() {
        let err = CoreError::store("connection reset");
        assert!(matches!(err, CoreError::StoreFailure(_)));
        assert_eq!(err.to_string(), "Store failure: connection reset");
        assert!(std::error::Error::source(&err).is_some());
    }
}
