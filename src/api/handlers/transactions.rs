//! `GET /getStockTransactions` (§6) — a user's parent and child stock
//! transactions, most recent first.

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::Json;

use crate::auth::AuthUser;
use crate::models::StockTransaction;
use crate::utils::{ApiResponse, AppError};
use crate::AppState;

pub async fn get_stock_transactions(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<StockTransaction>>>, AppError> {
    let txs = state
        .journal
        .find_stock_tx_by_user(&auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(txs)))
}
