use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use pedidos_core::{NewOrder, Order, OrderId};

use crate::{
    error::AppError,
    extract::{AppJson, AppPath},
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub message: String,
    pub order: Order,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/status", post(update_status))
        .route("/api/history/orders", get(order_history))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/orders
async fn list_orders(State(state): State<AppState>) -> Result<Json<OrderListResponse>, AppError> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(OrderListResponse { orders }))
}

/// GET /api/history/orders
async fn order_history(State(state): State<AppState>) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// POST /api/orders
/// New orders always start out Pending
async fn create_order(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewOrder>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let order = state.orders.create_order(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            message: "Order created".to_string(),
            order,
        }),
    ))
}

/// GET /api/orders/{id}
async fn get_order(
    State(state): State<AppState>,
    AppPath(order_id): AppPath<OrderId>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.orders.get_order(order_id).await?))
}

/// POST /api/orders/{id}/status
/// Pending → Shipped debits stock; other transitions only change the status
async fn update_status(
    State(state): State<AppState>,
    AppPath(order_id): AppPath<OrderId>,
    AppJson(req): AppJson<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.fulfillment.transition(order_id, &req.status).await?;
    Ok(Json(OrderResponse {
        message: "Status updated".to_string(),
        order,
    }))
}
