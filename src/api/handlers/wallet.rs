//! `GET /getWalletTransactions` (§6) — a user's wallet transaction log,
//! most recent first.

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::Json;

use crate::auth::AuthUser;
use crate::models::WalletTransaction;
use crate::utils::{ApiResponse, AppError};
use crate::AppState;

pub async fn get_wallet_transactions(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<WalletTransaction>>>, AppError> {
    let entries = state.journal.find_wallet_log(&auth_user.user_id).await?;
    Ok(Json(ApiResponse::success(entries)))
}
