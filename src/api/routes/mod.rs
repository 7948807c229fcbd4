use axum::{middleware as axum_middleware, routing::{get, post}, Router};
use std::sync::Arc;

use crate::api::handlers;
use crate::auth::middleware::auth_middleware;
use crate::AppState;

/// §6: all five endpoints sit behind bearer auth — there is no public
/// surface in this crate (login/registration are out of scope, §1).
pub fn create_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/placeStockOrder", post(handlers::order::place_stock_order))
        .route(
            "/cancelStockTransaction",
            post(handlers::order::cancel_stock_transaction),
        )
        .route("/getStockPrices", get(handlers::prices::get_stock_prices))
        .route(
            "/getStockTransactions",
            get(handlers::transactions::get_stock_transactions),
        )
        .route(
            "/getWalletTransactions",
            get(handlers::wallet::get_wallet_transactions),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
}
