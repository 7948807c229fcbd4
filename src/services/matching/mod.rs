//! Matching Engine Core.
//!
//! ```text
//! API Handler
//!   -> Engine Façade (validation, envelope shaping)
//!   -> MatchingEngine (PlaceBuy/PlaceSell/MatchQueued/Cancel/BestPrices)
//!        -> OrderBookRegistry (per-symbol books, in-memory)
//!        -> WalletLedgerPort / PortfolioStorePort / TransactionJournalPort / StockCatalogPort
//! ```
//!
//! The four ports are adapters: a live deployment wires Redis/Postgres
//! implementations (`crate::cache::wallet_ledger`, `crate::services::adapters`);
//! engine unit tests wire the in-memory fakes in `ports::fakes` instead.

mod engine;
mod facade;
mod orderbook;
mod ports;
mod types;

pub use engine::MatchingEngine;
pub use facade::EngineFacade;
pub use orderbook::OrderBookRegistry;
pub use ports::{PortfolioStorePort, StockCatalogPort, StockTxPatch, TransactionJournalPort, WalletLedgerPort};
pub use types::*;
