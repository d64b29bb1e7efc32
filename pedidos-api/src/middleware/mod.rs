pub mod auth;

pub use auth::{stock_in_auth_middleware, Operator};
