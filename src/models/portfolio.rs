use serde::{Deserialize, Serialize};

/// A user's holding in a single stock. Rows are created on first positive delta
/// and pruned once `quantity_owned` reaches zero (§4.1/§4.2 reservation semantics).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PortfolioEntry {
    pub user_id: String,
    pub stock_id: String,
    pub stock_name: String,
    pub quantity_owned: i64,
}
