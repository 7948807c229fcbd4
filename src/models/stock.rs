use serde::{Deserialize, Serialize};

/// Catalog entry. Created once by the (out-of-scope) catalog service; this crate
/// only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stock {
    pub stock_id: String,
    pub stock_name: String,
}

pub const UNKNOWN_STOCK_NAME: &str = "Unknown";
