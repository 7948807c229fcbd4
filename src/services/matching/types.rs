//! Shared types for the Matching Engine and Order Book.
//!
//! Buys are always MARKET; sells are always LIMIT (§1 Non-goals) — there is
//! deliberately no generic `Side`/`OrderType` combinator here, since the two
//! order shapes this engine accepts are not symmetric.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub use crate::models::{OrderStatus, OrderType};

/// A resting LIMIT sell in the order book.
#[derive(Debug, Clone)]
pub struct SellEntry {
    pub user_id: String,
    pub price: Decimal,
    pub remaining_quantity: i64,
    pub accepted_at: DateTime<Utc>,
    /// insertion sequence number, the terminal FIFO tiebreaker for entries that
    /// land in the same millisecond
    pub sequence: u64,
    pub stock_tx_id: Uuid,
}

/// An unfilled residual of a market buy, waiting for liquidity.
#[derive(Debug, Clone)]
pub struct QueuedBuy {
    pub user_id: String,
    pub remaining_quantity: i64,
    pub accepted_at: DateTime<Utc>,
    pub sequence: u64,
    /// The buy's own parent stock_tx_id; fills attach children here, never to
    /// a fresh parent (§4.4).
    pub parent_stock_tx_id: Uuid,
}

/// One executed fill, already durably recorded (journal + wallet) by the time
/// it is returned to a caller.
#[derive(Debug, Clone, Serialize)]
pub struct Fill {
    pub child_stock_tx_id: Uuid,
    pub wallet_tx_id: Uuid,
    pub buyer_id: String,
    pub seller_id: String,
    pub quantity: i64,
    pub price: Decimal,
    pub time_stamp: DateTime<Utc>,
}

/// Result of `PlaceBuy` (§4.3).
#[derive(Debug, Clone)]
pub struct PlaceBuyResult {
    pub stock_tx_id: Uuid,
    pub order_status: OrderStatus,
    pub trade_details: Vec<Fill>,
}

/// Result of `PlaceSell` (§4.2).
#[derive(Debug, Clone)]
pub struct PlaceSellResult {
    pub stock_tx_id: Uuid,
}

/// A `BestPrices` row (§4.6).
#[derive(Debug, Clone)]
pub struct StockPriceQuote {
    pub stock_id: String,
    pub stock_name: String,
    pub current_price: Option<Decimal>,
}

/// Error taxonomy from §7, surfaced through the Engine Façade into the HTTP
/// error envelope.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("insufficient stock: user does not own enough {0} to sell")]
    InsufficientStock(String),

    #[error("portfolio update failed for user {0}")]
    PortfolioUpdateFailed(String),

    #[error("transaction not found: {0}")]
    NotFound(Uuid),

    #[error("duplicate stock transaction id: {0}")]
    Conflict(Uuid),

    #[error("dependency failure: {0}")]
    Dependency(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for MatchingError {
    fn from(err: sqlx::Error) -> Self {
        MatchingError::Dependency(format!("postgres: {err}"))
    }
}

impl From<redis::RedisError> for MatchingError {
    fn from(err: redis::RedisError) -> Self {
        MatchingError::Dependency(format!("redis: {err}"))
    }
}

/// Truncates (floors) a VWAP/affordability computation to the resolution the
/// rest of the system deals in. §9 Open Questions: truncation, not rounding.
pub fn floor_decimal(value: Decimal) -> Decimal {
    value.trunc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_floor_decimal_truncates_toward_zero() {
        assert_eq!(floor_decimal(dec!(12.99)), dec!(12));
        assert_eq!(floor_decimal(dec!(12.01)), dec!(12));
        assert_eq!(floor_decimal(dec!(12)), dec!(12));
    }
}
