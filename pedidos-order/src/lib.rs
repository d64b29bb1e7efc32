pub mod fulfillment;
pub mod guards;
pub mod manager;

pub use fulfillment::OrderFulfillment;
pub use guards::TransitionGuard;
pub use manager::OrderManager;
