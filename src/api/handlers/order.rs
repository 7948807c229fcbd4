//! `POST /placeStockOrder` and `POST /cancelStockTransaction` (§6).

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::services::matching::PlaceStockOrderRequest;
use crate::utils::{ApiResponse, AppError};
use crate::AppState;

pub async fn place_stock_order(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<PlaceStockOrderRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    tracing::info!(
        user_id = %auth_user.user_id,
        stock_id = %req.stock_id,
        is_buy = req.is_buy,
        quantity = req.quantity,
        "placeStockOrder"
    );

    let result = state
        .facade
        .place_stock_order(&auth_user.user_id, req)
        .await
        .map_err(|e| {
            tracing::warn!(user_id = %auth_user.user_id, error = %e, "placeStockOrder rejected");
            e
        })?;

    let data = serde_json::json!({
        "order_status": result.order_status,
        "stock_tx_id": result.stock_tx_id,
        "trade_details": result.trade_details,
    });
    Ok(Json(ApiResponse::success(data)))
}

#[derive(Debug, serde::Deserialize)]
pub struct CancelStockTransactionRequest {
    pub stock_tx_id: Uuid,
}

pub async fn cancel_stock_transaction(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<CancelStockTransactionRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    tracing::info!(
        user_id = %auth_user.user_id,
        stock_tx_id = %req.stock_tx_id,
        "cancelStockTransaction"
    );

    state
        .facade
        .cancel_stock_transaction(&auth_user.user_id, req.stock_tx_id)
        .await
        .map_err(|e| {
            tracing::warn!(user_id = %auth_user.user_id, error = %e, "cancelStockTransaction rejected");
            e
        })?;

    Ok(Json(ApiResponse::success(Value::Null)))
}
