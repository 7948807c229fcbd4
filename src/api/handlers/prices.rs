//! `GET /getStockPrices` (§4.6, §6).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::utils::ApiResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StockPriceRow {
    pub stock_id: String,
    pub stock_name: String,
    pub current_price: Option<rust_decimal::Decimal>,
}

pub async fn get_stock_prices(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<StockPriceRow>>> {
    let quotes = state.facade.get_stock_prices().await;
    let rows = quotes
        .into_iter()
        .map(|q| StockPriceRow {
            stock_id: q.stock_id,
            stock_name: q.stock_name,
            current_price: q.current_price,
        })
        .collect();
    Json(ApiResponse::success(rows))
}
