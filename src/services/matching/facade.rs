//! Engine Façade (§4.7): validates already-authenticated request shapes and
//! shapes `MatchingEngine` results into the uniform response envelope
//! consumed by `crate::api::handlers`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::engine::MatchingEngine;
use super::types::{Fill, MatchingError, OrderStatus, OrderType, StockPriceQuote};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceStockOrderRequest {
    pub stock_id: String,
    pub is_buy: bool,
    pub order_type: OrderType,
    pub quantity: i64,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceStockOrderResponse {
    pub order_status: OrderStatus,
    pub stock_tx_id: Uuid,
    pub trade_details: Vec<Fill>,
}

pub struct EngineFacade {
    engine: Arc<MatchingEngine>,
}

impl EngineFacade {
    pub fn new(engine: Arc<MatchingEngine>) -> Self {
        Self { engine }
    }

    /// §4.7: `{stock_id, is_buy, order_type, quantity>0}`, plus `price>0` for
    /// sells. A buy with `order_type != MARKET` or a sell with
    /// `order_type != LIMIT` is rejected rather than silently coerced.
    pub async fn place_stock_order(
        &self,
        user_id: &str,
        req: PlaceStockOrderRequest,
    ) -> Result<PlaceStockOrderResponse, MatchingError> {
        if req.quantity <= 0 {
            return Err(MatchingError::Validation(
                "quantity must be positive".to_string(),
            ));
        }

        match (req.is_buy, req.order_type) {
            (true, OrderType::Market) => {
                let result = self
                    .engine
                    .place_buy(user_id, &req.stock_id, req.price, req.quantity)
                    .await?;
                Ok(PlaceStockOrderResponse {
                    order_status: result.order_status,
                    stock_tx_id: result.stock_tx_id,
                    trade_details: result.trade_details,
                })
            }
            (false, OrderType::Limit) => {
                let price = req
                    .price
                    .filter(|p| *p > Decimal::ZERO)
                    .ok_or_else(|| MatchingError::Validation("sell requires a positive price".to_string()))?;
                let result = self
                    .engine
                    .place_sell(user_id, &req.stock_id, price, req.quantity)
                    .await?;
                Ok(PlaceStockOrderResponse {
                    order_status: OrderStatus::InProgress,
                    stock_tx_id: result.stock_tx_id,
                    trade_details: Vec::new(),
                })
            }
            _ => Err(MatchingError::Validation(
                "a buy must be MARKET and a sell must be LIMIT".to_string(),
            )),
        }
    }

    pub async fn cancel_stock_transaction(&self, user_id: &str, stock_tx_id: Uuid) -> Result<(), MatchingError> {
        self.engine.cancel(user_id, stock_tx_id).await
    }

    pub async fn get_stock_prices(&self) -> Vec<StockPriceQuote> {
        self.engine.best_prices().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::ports::fakes::{
        InMemoryPortfolioStore, InMemoryStockCatalog, InMemoryTransactionJournal, InMemoryWalletLedger,
    };
    use rust_decimal_macros::dec;

    fn facade() -> EngineFacade {
        let engine = MatchingEngine::new(
            Arc::new(InMemoryWalletLedger::default()),
            Arc::new(InMemoryPortfolioStore::default()),
            Arc::new(InMemoryTransactionJournal::default()),
            Arc::new(InMemoryStockCatalog::default()),
        );
        EngineFacade::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let req = PlaceStockOrderRequest {
            stock_id: "S1".to_string(),
            is_buy: true,
            order_type: OrderType::Market,
            quantity: 0,
            price: None,
        };
        let err = facade().place_stock_order("u", req).await.unwrap_err();
        assert!(matches!(err, MatchingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rejects_buy_with_limit_order_type() {
        let req = PlaceStockOrderRequest {
            stock_id: "S1".to_string(),
            is_buy: true,
            order_type: OrderType::Limit,
            quantity: 5,
            price: None,
        };
        let err = facade().place_stock_order("u", req).await.unwrap_err();
        assert!(matches!(err, MatchingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rejects_sell_without_price() {
        let req = PlaceStockOrderRequest {
            stock_id: "S1".to_string(),
            is_buy: false,
            order_type: OrderType::Limit,
            quantity: 5,
            price: None,
        };
        let err = facade().place_stock_order("u", req).await.unwrap_err();
        assert!(matches!(err, MatchingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_accepts_valid_sell() {
        let req = PlaceStockOrderRequest {
            stock_id: "S1".to_string(),
            is_buy: false,
            order_type: OrderType::Limit,
            quantity: 5,
            price: Some(dec!(10)),
        };
        // no portfolio seeded, so this surfaces InsufficientStock rather than Validation.
        let err = facade().place_stock_order("u", req).await.unwrap_err();
        assert!(matches!(err, MatchingError::InsufficientStock(_)));
    }
}
