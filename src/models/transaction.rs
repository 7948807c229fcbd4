use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order status DAG: `IN_PROGRESS -> {COMPLETED, PARTIALLY_COMPLETED, CANCELLED}`,
/// with `INCOMPLETE` marking a market buy that queued with zero fills. Child
/// fills are born `COMPLETED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    InProgress,
    Incomplete,
    PartiallyCompleted,
    Completed,
    Cancelled,
}

/// Buys are always MARKET; sells are always LIMIT (§1 Non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

/// A parent or child stock transaction record (§3 data model).
///
/// Parents have `parent_stock_tx_id = None`; children share their parent's id
/// here and are born with `status = Completed`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockTransaction {
    pub stock_tx_id: Uuid,
    pub parent_stock_tx_id: Option<Uuid>,
    pub stock_id: String,
    pub wallet_tx_id: Option<Uuid>,
    pub user_id: String,
    pub order_status: OrderStatus,
    pub is_buy: bool,
    pub order_type: OrderType,
    /// Null only for a freshly queued MARKET buy with no fills yet.
    pub stock_price: Option<Decimal>,
    pub quantity: i64,
    /// Tracks unfilled residual on the parent; always 0 on children.
    pub remaining_quantity: i64,
    pub time_stamp: DateTime<Utc>,
}

/// One side (debit or credit) of a wallet movement tied to a single fill.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WalletTransaction {
    pub user_id: String,
    pub stock_tx_id: Uuid,
    pub wallet_tx_id: Uuid,
    pub is_debit: bool,
    pub amount: Decimal,
    pub time_stamp: DateTime<Utc>,
}
