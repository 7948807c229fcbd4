//! Port traits the Matching Engine depends on (§2, §6). Any conforming
//! adapter may be substituted; the engine only ever sees these traits.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::types::MatchingError;

/// Keyed balance store. `add` must initialize-if-absent and be atomic per
/// user; reads must observe the last successful add by the same caller (§2.1).
#[async_trait]
pub trait WalletLedgerPort: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Decimal, MatchingError>;
    async fn add(&self, user_id: &str, delta: Decimal) -> Result<(), MatchingError>;
}

/// Per-user list of `(stock_id, stock_name, quantity_owned)` entries (§2.2).
#[async_trait]
pub trait PortfolioStorePort: Send + Sync {
    async fn get_quantity(&self, user_id: &str, stock_id: &str) -> Result<i64, MatchingError>;

    /// Applies `delta` to the user's holding of `stock_id`, creating the row
    /// (seeded with `stock_name`) if it is the first positive delta, and
    /// pruning it once the resulting quantity is `<= 0`. Returns `false` when
    /// a negative delta cannot be satisfied by the existing row (caller did
    /// not already verify sufficient quantity).
    async fn apply_delta(
        &self,
        user_id: &str,
        stock_id: &str,
        delta: i64,
        stock_name_on_create: &str,
    ) -> Result<bool, MatchingError>;
}

/// Append-and-update store for stock transactions and the per-user wallet
/// transaction log (§2.3).
#[async_trait]
pub trait TransactionJournalPort: Send + Sync {
    async fn insert_stock_tx(
        &self,
        tx: &crate::models::StockTransaction,
    ) -> Result<(), MatchingError>;

    async fn update_stock_tx(
        &self,
        stock_tx_id: uuid::Uuid,
        patch: StockTxPatch,
    ) -> Result<(), MatchingError>;

    async fn find_stock_tx(
        &self,
        stock_tx_id: uuid::Uuid,
    ) -> Result<Option<crate::models::StockTransaction>, MatchingError>;

    async fn append_wallet_tx(
        &self,
        entry: &crate::models::WalletTransaction,
    ) -> Result<(), MatchingError>;

    async fn find_stock_tx_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<crate::models::StockTransaction>, MatchingError>;

    /// All child fills recorded against `parent_stock_tx_id` so far, in no
    /// particular order. Used to compute the VWAP over a parent's *entire*
    /// fill history — which may span several `PlaceBuy`/`MatchQueued` rounds
    /// — rather than just the fills from whichever round last completed it.
    async fn find_child_stock_txs(
        &self,
        parent_stock_tx_id: uuid::Uuid,
    ) -> Result<Vec<crate::models::StockTransaction>, MatchingError>;

    async fn find_wallet_log(
        &self,
        user_id: &str,
    ) -> Result<Vec<crate::models::WalletTransaction>, MatchingError>;
}

/// Partial update applied to a parent/child stock transaction. `None` fields
/// are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct StockTxPatch {
    pub order_status: Option<crate::models::OrderStatus>,
    pub stock_price: Option<rust_decimal::Decimal>,
    pub wallet_tx_id: Option<uuid::Uuid>,
    pub remaining_quantity: Option<i64>,
}

/// `stock_id -> stock_name` lookup (§2.4). Read-only from this crate.
#[async_trait]
pub trait StockCatalogPort: Send + Sync {
    async fn name_for(&self, stock_id: &str) -> String;
}

#[cfg(test)]
pub mod fakes {
    //! In-memory port fakes used by the Matching Engine's own unit tests
    //! (§8.1) so core behavior can be exercised with no live Postgres/Redis.

    use super::*;
    use crate::models::{OrderStatus, PortfolioEntry, StockTransaction, WalletTransaction};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use uuid::Uuid;

    #[derive(Default)]
    pub struct InMemoryWalletLedger {
        balances: Mutex<HashMap<String, Decimal>>,
    }

    impl InMemoryWalletLedger {
        pub fn seeded(seed: &[(&str, Decimal)]) -> Self {
            let ledger = Self::default();
            for (user, balance) in seed {
                ledger.balances.lock().insert(user.to_string(), *balance);
            }
            ledger
        }
    }

    #[async_trait]
    impl WalletLedgerPort for InMemoryWalletLedger {
        async fn get(&self, user_id: &str) -> Result<Decimal, MatchingError> {
            Ok(*self
                .balances
                .lock()
                .entry(user_id.to_string())
                .or_insert(Decimal::ZERO))
        }

        async fn add(&self, user_id: &str, delta: Decimal) -> Result<(), MatchingError> {
            let mut balances = self.balances.lock();
            let entry = balances.entry(user_id.to_string()).or_insert(Decimal::ZERO);
            *entry += delta;
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct InMemoryPortfolioStore {
        entries: Mutex<HashMap<(String, String), PortfolioEntry>>,
    }

    impl InMemoryPortfolioStore {
        pub fn seeded(seed: &[(&str, &str, &str, i64)]) -> Self {
            let store = Self::default();
            for (user, stock_id, stock_name, qty) in seed {
                store.entries.lock().insert(
                    (user.to_string(), stock_id.to_string()),
                    PortfolioEntry {
                        user_id: user.to_string(),
                        stock_id: stock_id.to_string(),
                        stock_name: stock_name.to_string(),
                        quantity_owned: *qty,
                    },
                );
            }
            store
        }

        pub fn quantity(&self, user_id: &str, stock_id: &str) -> i64 {
            self.entries
                .lock()
                .get(&(user_id.to_string(), stock_id.to_string()))
                .map(|e| e.quantity_owned)
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl PortfolioStorePort for InMemoryPortfolioStore {
        async fn get_quantity(&self, user_id: &str, stock_id: &str) -> Result<i64, MatchingError> {
            Ok(self.quantity(user_id, stock_id))
        }

        async fn apply_delta(
            &self,
            user_id: &str,
            stock_id: &str,
            delta: i64,
            stock_name_on_create: &str,
        ) -> Result<bool, MatchingError> {
            let mut entries = self.entries.lock();
            let key = (user_id.to_string(), stock_id.to_string());
            match entries.get_mut(&key) {
                Some(entry) => {
                    let new_qty = entry.quantity_owned + delta;
                    if new_qty <= 0 {
                        entries.remove(&key);
                    } else {
                        entry.quantity_owned = new_qty;
                    }
                    Ok(true)
                }
                None => {
                    if delta > 0 {
                        entries.insert(
                            key,
                            PortfolioEntry {
                                user_id: user_id.to_string(),
                                stock_id: stock_id.to_string(),
                                stock_name: stock_name_on_create.to_string(),
                                quantity_owned: delta,
                            },
                        );
                        Ok(true)
                    } else {
                        Ok(false)
                    }
                }
            }
        }
    }

    #[derive(Default)]
    pub struct InMemoryTransactionJournal {
        stock_txs: Mutex<HashMap<Uuid, StockTransaction>>,
        wallet_txs: Mutex<Vec<WalletTransaction>>,
    }

    #[async_trait]
    impl TransactionJournalPort for InMemoryTransactionJournal {
        async fn insert_stock_tx(&self, tx: &StockTransaction) -> Result<(), MatchingError> {
            let mut txs = self.stock_txs.lock();
            if txs.contains_key(&tx.stock_tx_id) {
                return Err(MatchingError::Conflict(tx.stock_tx_id));
            }
            txs.insert(tx.stock_tx_id, tx.clone());
            Ok(())
        }

        async fn update_stock_tx(
            &self,
            stock_tx_id: Uuid,
            patch: StockTxPatch,
        ) -> Result<(), MatchingError> {
            let mut txs = self.stock_txs.lock();
            let tx = txs
                .get_mut(&stock_tx_id)
                .ok_or(MatchingError::NotFound(stock_tx_id))?;
            if let Some(status) = patch.order_status {
                tx.order_status = status;
            }
            if let Some(price) = patch.stock_price {
                tx.stock_price = Some(price);
            }
            if let Some(wallet_tx_id) = patch.wallet_tx_id {
                tx.wallet_tx_id = Some(wallet_tx_id);
            }
            if let Some(remaining) = patch.remaining_quantity {
                tx.remaining_quantity = remaining;
            }
            Ok(())
        }

        async fn find_stock_tx(
            &self,
            stock_tx_id: Uuid,
        ) -> Result<Option<StockTransaction>, MatchingError> {
            Ok(self.stock_txs.lock().get(&stock_tx_id).cloned())
        }

        async fn append_wallet_tx(&self, entry: &WalletTransaction) -> Result<(), MatchingError> {
            self.wallet_txs.lock().push(entry.clone());
            Ok(())
        }

        async fn find_stock_tx_by_user(
            &self,
            user_id: &str,
        ) -> Result<Vec<StockTransaction>, MatchingError> {
            Ok(self
                .stock_txs
                .lock()
                .values()
                .filter(|tx| tx.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn find_child_stock_txs(
            &self,
            parent_stock_tx_id: Uuid,
        ) -> Result<Vec<StockTransaction>, MatchingError> {
            Ok(self
                .stock_txs
                .lock()
                .values()
                .filter(|tx| tx.parent_stock_tx_id == Some(parent_stock_tx_id))
                .cloned()
                .collect())
        }

        async fn find_wallet_log(
            &self,
            user_id: &str,
        ) -> Result<Vec<WalletTransaction>, MatchingError> {
            Ok(self
                .wallet_txs
                .lock()
                .iter()
                .filter(|w| w.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    impl InMemoryTransactionJournal {
        pub fn status_of(&self, stock_tx_id: Uuid) -> Option<OrderStatus> {
            self.stock_txs
                .lock()
                .get(&stock_tx_id)
                .map(|tx| tx.order_status)
        }
    }

    #[derive(Default)]
    pub struct InMemoryStockCatalog {
        names: Mutex<HashMap<String, String>>,
    }

    impl InMemoryStockCatalog {
        pub fn seeded(seed: &[(&str, &str)]) -> Self {
            let catalog = Self::default();
            for (stock_id, stock_name) in seed {
                catalog
                    .names
                    .lock()
                    .insert(stock_id.to_string(), stock_name.to_string());
            }
            catalog
        }
    }

    #[async_trait]
    impl StockCatalogPort for InMemoryStockCatalog {
        async fn name_for(&self, stock_id: &str) -> String {
            self.names
                .lock()
                .get(stock_id)
                .cloned()
                .unwrap_or_else(|| crate::models::stock::UNKNOWN_STOCK_NAME.to_string())
        }
    }
}
