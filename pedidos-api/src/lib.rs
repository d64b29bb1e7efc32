use axum::{
    http::{Method, StatusCode},
    Router,
};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod extract;
pub mod health;
pub mod inventory;
pub mod middleware;
pub mod orders;
pub mod state;

pub use state::AppState;

/// Builds the HTTP router. `request_timeout` bounds each request, store
/// waits included; the services themselves never time out.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static(middleware::auth::OPERATOR_HEADER),
            axum::http::HeaderName::from_static(middleware::auth::INVENTORY_KEY_HEADER),
        ]);

    Router::new()
        .merge(health::routes())
        .merge(orders::routes())
        .merge(inventory::routes(state.clone()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
