use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;

use pedidos_core::{InventoryItem, MovementRecord};
use pedidos_inventory::StockIn;

use crate::{
    error::AppError,
    extract::AppJson,
    middleware::{stock_in_auth_middleware, Operator},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct StockInResponse {
    pub message: String,
    pub item: InventoryItem,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let stock_in = Router::new()
        .route("/api/inventory/stock-in", post(stock_in))
        .layer(axum::middleware::from_fn_with_state(state, stock_in_auth_middleware));

    Router::new()
        .route("/api/inventory", get(list_inventory))
        .route("/api/movements", get(list_movements))
        .route("/api/history/movements", get(list_movements))
        .merge(stock_in)
}

/// GET /api/inventory
async fn list_inventory(State(state): State<AppState>) -> Result<Json<Vec<InventoryItem>>, AppError> {
    Ok(Json(state.stock.list_inventory().await?))
}

/// GET /api/movements
async fn list_movements(State(state): State<AppState>) -> Result<Json<Vec<MovementRecord>>, AppError> {
    Ok(Json(state.stock.list_movements().await?))
}

/// POST /api/inventory/stock-in
async fn stock_in(
    State(state): State<AppState>,
    Extension(operator): Extension<Operator>,
    AppJson(mut req): AppJson<StockIn>,
) -> Result<Json<StockInResponse>, AppError> {
    if req.reference.is_none() {
        if let Operator(Some(id)) = operator {
            req.reference = Some(format!("Manual stock-in by operator {}", id));
        }
    }

    let quantity = req.quantity;
    let item = state.stock.add_stock(req).await?;
    Ok(Json(StockInResponse {
        message: format!("{} units of {} added to inventory", quantity, item.product),
        item,
    }))
}
