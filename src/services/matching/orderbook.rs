//! Per-symbol order book (§4.1).
//!
//! Deliberately asymmetric: sells are LIMIT orders and rest in true
//! price-time priority (`BTreeMap<Decimal, VecDeque<SellEntry>>`); buys are
//! always MARKET and never rest at a price, so the only thing that "rests"
//! on the buy side is an unfilled residual queued in pure FIFO order
//! (`VecDeque<QueuedBuy>`, no price key at all). This is not the teacher's
//! symmetric bids/asks book — the two sides of this market are not
//! symmetric (§1 Non-goals, §4.4).
//!
//! Each symbol's book is guarded by a `tokio::sync::Mutex` rather than a
//! sync lock: the Matching Engine holds this guard across the port calls
//! (wallet/portfolio/journal) that execute inline per fill (§4.3, §5), so
//! the lock must be safely held across `.await` points.

use super::types::{QueuedBuy, SellEntry};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// The resting state of one symbol's book. Exposed to the Matching Engine
/// through `SymbolBook::lock`, which returns a guard over this directly —
/// the engine needs multi-step, lock-held sequences (peek, await a port
/// call, then consume) that a narrower method-per-step API can't express
/// without re-acquiring the lock between steps and losing atomicity.
#[derive(Default)]
pub struct BookState {
    sells: BTreeMap<Decimal, VecDeque<SellEntry>>,
    queued_buys: VecDeque<QueuedBuy>,
}

impl BookState {
    pub fn insert_sell(&mut self, entry: SellEntry) {
        self.sells
            .entry(entry.price)
            .or_insert_with(VecDeque::new)
            .push_back(entry);
    }

    pub fn push_queued_buy(&mut self, entry: QueuedBuy) {
        self.queued_buys.push_back(entry);
    }

    /// The lowest resting ask, for `BestPrices` (§4.6).
    pub fn best_price(&self) -> Option<Decimal> {
        self.sells
            .iter()
            .find(|(_, q)| !q.is_empty())
            .map(|(price, _)| *price)
    }

    /// First resting sell not owned by `buyer_id`, in true price-time order
    /// (§4.3 step b, self-trade prevention). Does not mutate the book —
    /// callers must await an affordability check against this price before
    /// deciding how much (if any) of it to consume.
    pub fn peek_matching_sell(&self, buyer_id: &str) -> Option<(Decimal, SellEntry)> {
        for (price, queue) in self.sells.iter() {
            if let Some(entry) = queue.iter().find(|e| e.user_id != buyer_id) {
                return Some((*price, entry.clone()));
            }
        }
        None
    }

    /// Consumes up to `quantity` shares from the sell identified by
    /// `stock_tx_id` at `price`. Returns the quantity actually consumed
    /// (0 if the entry is no longer there — e.g. cancelled concurrently).
    /// Removes the entry once its remaining quantity reaches zero, and
    /// prunes the price level once its queue is empty.
    pub fn consume_sell(&mut self, price: Decimal, stock_tx_id: Uuid, quantity: i64) -> i64 {
        let Some(queue) = self.sells.get_mut(&price) else {
            return 0;
        };
        let Some(entry) = queue.iter_mut().find(|e| e.stock_tx_id == stock_tx_id) else {
            return 0;
        };
        let taken = quantity.min(entry.remaining_quantity);
        entry.remaining_quantity -= taken;
        if entry.remaining_quantity == 0 {
            queue.retain(|e| e.stock_tx_id != stock_tx_id);
            if queue.is_empty() {
                self.sells.remove(&price);
            }
        }
        taken
    }

    /// Removes a resting sell by its own `stock_tx_id`, wherever it sits
    /// (used by `Cancel`, §4.5).
    pub fn remove_sell_by_tx(&mut self, stock_tx_id: Uuid) -> Option<SellEntry> {
        for (price, queue) in self.sells.iter_mut() {
            if let Some(pos) = queue.iter().position(|e| e.stock_tx_id == stock_tx_id) {
                let entry = queue.remove(pos);
                let price = *price;
                if queue.is_empty() {
                    self.sells.remove(&price);
                }
                return entry;
            }
        }
        None
    }

    /// Removes a queued market buy residual by its parent's `stock_tx_id`
    /// (used by `Cancel` on a `PARTIALLY_COMPLETED` parent, §4.5, §9).
    pub fn remove_queued_buy_by_tx(&mut self, parent_stock_tx_id: Uuid) -> Option<QueuedBuy> {
        let pos = self
            .queued_buys
            .iter()
            .position(|b| b.parent_stock_tx_id == parent_stock_tx_id)?;
        self.queued_buys.remove(pos)
    }

    pub fn front_queued_buy(&self) -> Option<&QueuedBuy> {
        self.queued_buys.front()
    }

    pub fn pop_front_queued_buy(&mut self) -> Option<QueuedBuy> {
        self.queued_buys.pop_front()
    }

    pub fn push_front_queued_buy(&mut self, entry: QueuedBuy) {
        self.queued_buys.push_front(entry);
    }
}

/// One symbol's book plus the sequence counter used to break ties between
/// entries that land in the same instant (§4.1 price-time priority).
pub struct SymbolBook {
    pub stock_id: String,
    state: Mutex<BookState>,
    sequence: AtomicU64,
}

impl SymbolBook {
    fn new(stock_id: String) -> Self {
        Self {
            stock_id,
            state: Mutex::new(BookState::default()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn lock(&self) -> MutexGuard<'_, BookState> {
        self.state.lock().await
    }
}

/// Lock-free symbol -> book registry (§4.1). Mirrors the teacher's
/// `DashMap`-backed registry pattern; unlike the teacher, books are created
/// lazily on first touch rather than pre-seeded at startup, since the
/// stock catalog here is an external, unbounded read-only table rather than
/// a fixed set of trading pairs.
#[derive(Default)]
pub struct OrderBookRegistry {
    books: DashMap<String, Arc<SymbolBook>>,
}

impl OrderBookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, stock_id: &str) -> Arc<SymbolBook> {
        self.books
            .entry(stock_id.to_string())
            .or_insert_with(|| Arc::new(SymbolBook::new(stock_id.to_string())))
            .clone()
    }

    pub fn get(&self, stock_id: &str) -> Option<Arc<SymbolBook>> {
        self.books.get(stock_id).map(|b| b.clone())
    }

    /// Snapshot of every symbol that currently has a book, for `BestPrices`
    /// (§4.6) — the caller still orders this lexicographically by
    /// `stock_name` against the catalog, per §9's redesign decision.
    pub fn symbols(&self) -> Vec<String> {
        self.books.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn sell(user_id: &str, price: Decimal, qty: i64, seq: u64) -> SellEntry {
        SellEntry {
            user_id: user_id.to_string(),
            price,
            remaining_quantity: qty,
            accepted_at: Utc::now(),
            sequence: seq,
            stock_tx_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_best_price_is_lowest_ask() {
        let book = SymbolBook::new("AAA".to_string());
        {
            let mut state = book.lock().await;
            state.insert_sell(sell("alice", dec!(12.00), 10, 0));
            state.insert_sell(sell("bob", dec!(9.50), 5, 1));
        }
        assert_eq!(book.lock().await.best_price(), Some(dec!(9.50)));
    }

    #[tokio::test]
    async fn test_peek_matching_sell_skips_self_trade() {
        let book = SymbolBook::new("AAA".to_string());
        let mut state = book.lock().await;
        state.insert_sell(sell("alice", dec!(9.00), 10, 0));
        state.insert_sell(sell("bob", dec!(9.50), 5, 1));

        let (price, entry) = state.peek_matching_sell("alice").expect("a match for bob's ask");
        assert_eq!(price, dec!(9.50));
        assert_eq!(entry.user_id, "bob");
    }

    #[tokio::test]
    async fn test_consume_sell_prunes_exhausted_level() {
        let book = SymbolBook::new("AAA".to_string());
        let entry = sell("bob", dec!(9.50), 5, 0);
        let tx_id = entry.stock_tx_id;
        {
            let mut state = book.lock().await;
            state.insert_sell(entry);
        }

        let mut state = book.lock().await;
        let taken = state.consume_sell(dec!(9.50), tx_id, 5);
        assert_eq!(taken, 5);
        assert_eq!(state.best_price(), None);
    }

    #[tokio::test]
    async fn test_cancel_removes_resting_sell() {
        let book = SymbolBook::new("AAA".to_string());
        let entry = sell("bob", dec!(9.50), 5, 0);
        let tx_id = entry.stock_tx_id;
        book.lock().await.insert_sell(entry);

        let removed = book.lock().await.remove_sell_by_tx(tx_id);
        assert!(removed.is_some());
        assert_eq!(book.lock().await.best_price(), None);
    }

    #[test]
    fn test_registry_reuses_book_per_symbol() {
        let registry = OrderBookRegistry::new();
        let a = registry.get_or_create("AAA");
        let b = registry.get_or_create("AAA");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.symbols(), vec!["AAA".to_string()]);
    }
}
