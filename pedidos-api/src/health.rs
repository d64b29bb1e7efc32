use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use pedidos_core::Store;
use serde::Serialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub time: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}

/// GET /ping
/// Round-trips to the store
async fn ping(State(state): State<AppState>) -> Result<Json<PingResponse>, AppError> {
    let time = state.store.ping().await?;
    Ok(Json(PingResponse { status: "ok", time }))
}
