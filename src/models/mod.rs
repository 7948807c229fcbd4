pub mod portfolio;
pub mod stock;
pub mod transaction;

pub use portfolio::PortfolioEntry;
pub use stock::Stock;
pub use transaction::{OrderStatus, OrderType, StockTransaction, WalletTransaction};
