use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::AppState};

pub const OPERATOR_HEADER: &str = "x-operator-id";
pub const INVENTORY_KEY_HEADER: &str = "x-inventory-key";

/// Operator id taken from the request, injected for downstream handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator(pub Option<i64>);

// ============================================================================
// Stock-in allow-list
// ============================================================================

/// Guards stock registration with the configured operator allow-list and
/// shared inventory key. Either check is skipped when it is not configured.
pub async fn stock_in_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = &state.auth;

    // 1. Operator allow-list
    let operator = match req.headers().get(OPERATOR_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .ok_or_else(|| AppError::AuthenticationError("Invalid operator id".to_string()))?,
        ),
        None => None,
    };

    if !auth.allowed_operators.is_empty() {
        let id = operator
            .ok_or_else(|| AppError::AuthenticationError("Missing operator id".to_string()))?;
        if !auth.allowed_operators.contains(&id) {
            tracing::warn!("Operator {} is not allowed to register stock", id);
            return Err(AppError::AuthorizationError(
                "Operator is not allowed to register stock".to_string(),
            ));
        }
    }

    // 2. Shared inventory key
    if let Some(expected) = auth.inventory_key.as_deref() {
        let provided = req
            .headers()
            .get(INVENTORY_KEY_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::AuthenticationError("Missing inventory key".to_string()))?;
        if provided != expected {
            return Err(AppError::AuthorizationError("Wrong inventory key".to_string()));
        }
    }

    // 3. Inject operator
    req.extensions_mut().insert(Operator(operator));

    Ok(next.run(req).await)
}
