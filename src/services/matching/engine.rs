//! The Matching Engine core (§4.2–§4.6): `PlaceSell`, `PlaceBuy`,
//! `MatchQueued`, `Cancel`, `BestPrices`.
//!
//! Unlike the teacher's `MatchingEngine`, whose `submit_order` is purely
//! synchronous and defers all persistence to a `broadcast`-subscribed
//! orchestrator, every operation here is `async fn` and calls its ports
//! inline, in the middle of the fill loop. The Wallet Ledger is the single
//! source of truth for balances (§9 design notes), and each fill's
//! affordability check depends on the balance left by the fill before it —
//! so the wallet/portfolio/journal writes cannot be deferred to an
//! after-the-fact worker the way the teacher defers trade persistence.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{OrderStatus, OrderType, StockTransaction, WalletTransaction};

use super::orderbook::OrderBookRegistry;
use super::ports::{PortfolioStorePort, StockCatalogPort, StockTxPatch, TransactionJournalPort, WalletLedgerPort};
use super::types::{floor_decimal, Fill, MatchingError, PlaceBuyResult, PlaceSellResult, QueuedBuy, SellEntry, StockPriceQuote};

enum CancelTarget {
    None,
    QueuedBuy,
    Sell(SellEntry),
}

pub struct MatchingEngine {
    books: OrderBookRegistry,
    wallet: Arc<dyn WalletLedgerPort>,
    portfolio: Arc<dyn PortfolioStorePort>,
    journal: Arc<dyn TransactionJournalPort>,
    catalog: Arc<dyn StockCatalogPort>,
}

impl MatchingEngine {
    pub fn new(
        wallet: Arc<dyn WalletLedgerPort>,
        portfolio: Arc<dyn PortfolioStorePort>,
        journal: Arc<dyn TransactionJournalPort>,
        catalog: Arc<dyn StockCatalogPort>,
    ) -> Self {
        Self {
            books: OrderBookRegistry::new(),
            wallet,
            portfolio,
            journal,
            catalog,
        }
    }

    /// §4.2.
    pub async fn place_sell(
        &self,
        user_id: &str,
        stock_id: &str,
        price: Decimal,
        quantity: i64,
    ) -> Result<PlaceSellResult, MatchingError> {
        if price <= Decimal::ZERO || quantity <= 0 {
            return Err(MatchingError::Validation(
                "price and quantity must be positive".to_string(),
            ));
        }

        let owned = self.portfolio.get_quantity(user_id, stock_id).await?;
        if owned < quantity {
            return Err(MatchingError::InsufficientStock(stock_id.to_string()));
        }

        let stock_name = self.catalog.name_for(stock_id).await;
        let reserved = self
            .portfolio
            .apply_delta(user_id, stock_id, -quantity, &stock_name)
            .await?;
        if !reserved {
            return Err(MatchingError::PortfolioUpdateFailed(user_id.to_string()));
        }

        let stock_tx_id = Uuid::new_v4();
        let now = Utc::now();
        let parent = StockTransaction {
            stock_tx_id,
            parent_stock_tx_id: None,
            stock_id: stock_id.to_string(),
            wallet_tx_id: None,
            user_id: user_id.to_string(),
            order_status: OrderStatus::InProgress,
            is_buy: false,
            order_type: OrderType::Limit,
            stock_price: Some(price),
            quantity,
            remaining_quantity: quantity,
            time_stamp: now,
        };
        self.journal.insert_stock_tx(&parent).await?;

        let book = self.books.get_or_create(stock_id);
        let sequence = book.next_sequence();
        {
            let mut state = book.lock().await;
            state.insert_sell(SellEntry {
                user_id: user_id.to_string(),
                price,
                remaining_quantity: quantity,
                accepted_at: now,
                sequence,
                stock_tx_id,
            });
        }

        // A new sell can satisfy buys already queued for this stock (§4.4).
        self.match_queued(stock_id).await?;

        Ok(PlaceSellResult { stock_tx_id })
    }

    /// §4.3.
    pub async fn place_buy(
        &self,
        user_id: &str,
        stock_id: &str,
        advisory_price: Option<Decimal>,
        quantity: i64,
    ) -> Result<PlaceBuyResult, MatchingError> {
        if quantity <= 0 {
            return Err(MatchingError::Validation(
                "quantity must be positive".to_string(),
            ));
        }

        let parent_tx_id = Uuid::new_v4();
        let now = Utc::now();
        let parent = StockTransaction {
            stock_tx_id: parent_tx_id,
            parent_stock_tx_id: None,
            stock_id: stock_id.to_string(),
            wallet_tx_id: None,
            user_id: user_id.to_string(),
            order_status: OrderStatus::InProgress,
            is_buy: true,
            order_type: OrderType::Market,
            stock_price: advisory_price,
            quantity,
            remaining_quantity: quantity,
            time_stamp: now,
        };
        self.journal.insert_stock_tx(&parent).await?;

        let (remaining, fills) = self
            .drain_sells_for_buyer(stock_id, user_id, parent_tx_id, quantity)
            .await?;

        let status = if remaining == 0 {
            OrderStatus::Completed
        } else if remaining < quantity {
            OrderStatus::PartiallyCompleted
        } else {
            OrderStatus::Incomplete
        };

        if remaining > 0 {
            self.queue_residual(stock_id, user_id, parent_tx_id, remaining, now)
                .await;
        }

        let mut patch = StockTxPatch {
            order_status: Some(status),
            remaining_quantity: Some(remaining),
            ..Default::default()
        };
        if status == OrderStatus::Completed {
            let (vwap, wallet_tx_id) = self.finalize_completion(parent_tx_id).await?;
            patch.stock_price = Some(vwap);
            patch.wallet_tx_id = Some(wallet_tx_id);
        }
        self.journal.update_stock_tx(parent_tx_id, patch).await?;

        Ok(PlaceBuyResult {
            stock_tx_id: parent_tx_id,
            order_status: status,
            trade_details: fills,
        })
    }

    /// §4.4. Drains the queue for `stock_id` against the resting sell side
    /// until either side is exhausted or the head of the queue can no
    /// longer be filled (e.g. the only liquidity left belongs to it).
    pub async fn match_queued(&self, stock_id: &str) -> Result<(), MatchingError> {
        loop {
            let book = self.books.get_or_create(stock_id);
            let head = { book.lock().await.front_queued_buy().cloned() };
            let Some(queued) = head else {
                return Ok(());
            };
            {
                let mut state = book.lock().await;
                state.pop_front_queued_buy();
            }

            let (remaining, fills) = self
                .drain_sells_for_buyer(
                    stock_id,
                    &queued.user_id,
                    queued.parent_stock_tx_id,
                    queued.remaining_quantity,
                )
                .await?;

            if fills.is_empty() {
                let mut state = book.lock().await;
                state.push_front_queued_buy(queued);
                return Ok(());
            }

            if remaining == 0 {
                let (vwap, wallet_tx_id) = self.finalize_completion(queued.parent_stock_tx_id).await?;
                self.journal
                    .update_stock_tx(
                        queued.parent_stock_tx_id,
                        StockTxPatch {
                            order_status: Some(OrderStatus::Completed),
                            remaining_quantity: Some(0),
                            stock_price: Some(vwap),
                            wallet_tx_id: Some(wallet_tx_id),
                        },
                    )
                    .await?;
            } else {
                self.journal
                    .update_stock_tx(
                        queued.parent_stock_tx_id,
                        StockTxPatch {
                            order_status: Some(OrderStatus::PartiallyCompleted),
                            remaining_quantity: Some(remaining),
                            ..Default::default()
                        },
                    )
                    .await?;
                let mut state = book.lock().await;
                state.push_front_queued_buy(QueuedBuy {
                    remaining_quantity: remaining,
                    ..queued
                });
                return Ok(());
            }
        }
    }

    /// §4.5.
    pub async fn cancel(&self, user_id: &str, stock_tx_id: Uuid) -> Result<(), MatchingError> {
        let parent = self
            .journal
            .find_stock_tx(stock_tx_id)
            .await?
            .ok_or(MatchingError::NotFound(stock_tx_id))?;

        if parent.user_id != user_id
            || matches!(parent.order_status, OrderStatus::Completed | OrderStatus::Cancelled)
        {
            return Err(MatchingError::NotFound(stock_tx_id));
        }

        let book = self.books.get_or_create(&parent.stock_id);
        let target = {
            let mut state = book.lock().await;
            if let Some(sell) = state.remove_sell_by_tx(stock_tx_id) {
                CancelTarget::Sell(sell)
            } else if state.remove_queued_buy_by_tx(stock_tx_id).is_some() {
                CancelTarget::QueuedBuy
            } else {
                CancelTarget::None
            }
        };

        match target {
            CancelTarget::None => return Err(MatchingError::NotFound(stock_tx_id)),
            CancelTarget::QueuedBuy => {}
            CancelTarget::Sell(sell) => {
                let stock_name = self.catalog.name_for(&parent.stock_id).await;
                self.portfolio
                    .apply_delta(user_id, &parent.stock_id, sell.remaining_quantity, &stock_name)
                    .await?;
            }
        }

        self.journal
            .update_stock_tx(
                stock_tx_id,
                StockTxPatch {
                    order_status: Some(OrderStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await?;

        Ok(())
    }

    /// §4.6.
    pub async fn best_prices(&self) -> Vec<StockPriceQuote> {
        let mut quotes = Vec::new();
        for stock_id in self.books.symbols() {
            if let Some(book) = self.books.get(&stock_id) {
                let current_price = book.lock().await.best_price();
                let stock_name = self.catalog.name_for(&stock_id).await;
                quotes.push(StockPriceQuote {
                    stock_id,
                    stock_name,
                    current_price,
                });
            }
        }
        quotes.sort_by(|a, b| a.stock_name.cmp(&b.stock_name));
        quotes
    }

    /// Mints the `wallet_tx_id` and VWAP a parent carries once COMPLETED
    /// (§3 invariant). Reads *all* of the parent's child fills from the
    /// journal rather than trusting the caller's own `fills` — a parent can
    /// complete across several rounds (an initial `place_buy` partial fill
    /// followed by a later `match_queued` sweep), and the VWAP is over the
    /// full history, not just the round that happened to finish it.
    async fn finalize_completion(&self, parent_tx_id: Uuid) -> Result<(Decimal, Uuid), MatchingError> {
        let children = self.journal.find_child_stock_txs(parent_tx_id).await?;
        let total_qty: i64 = children.iter().map(|c| c.quantity).sum();
        let total_value: Decimal = children
            .iter()
            .map(|c| c.stock_price.unwrap_or(Decimal::ZERO) * Decimal::from(c.quantity))
            .sum();
        let vwap = floor_decimal(total_value / Decimal::from(total_qty));
        Ok((vwap, Uuid::new_v4()))
    }

    async fn queue_residual(
        &self,
        stock_id: &str,
        user_id: &str,
        parent_tx_id: Uuid,
        remaining: i64,
        now: chrono::DateTime<Utc>,
    ) {
        let book = self.books.get_or_create(stock_id);
        let sequence = book.next_sequence();
        let mut state = book.lock().await;
        state.push_queued_buy(QueuedBuy {
            user_id: user_id.to_string(),
            remaining_quantity: remaining,
            accepted_at: now,
            sequence,
            parent_stock_tx_id: parent_tx_id,
        });
    }

    /// Common fill loop behind §4.3 step 3 and §4.4's MatchQueued sweep:
    /// repeatedly match `buyer_id` against the best non-self-trade resting
    /// sell for `stock_id`, clamping each fill to what the buyer can afford,
    /// until `remaining` reaches zero or no eligible sell remains. Holds the
    /// symbol's book lock for the whole call (§5's "single matching step").
    async fn drain_sells_for_buyer(
        &self,
        stock_id: &str,
        buyer_id: &str,
        parent_tx_id: Uuid,
        mut remaining: i64,
    ) -> Result<(i64, Vec<Fill>), MatchingError> {
        let book = self.books.get_or_create(stock_id);
        let mut fills = Vec::new();
        let mut state = book.lock().await;

        while remaining > 0 {
            let Some((price, head)) = state.peek_matching_sell(buyer_id) else {
                break;
            };

            let mut fill_qty = remaining.min(head.remaining_quantity);
            let mut fill_value = price * Decimal::from(fill_qty);

            let balance = self.wallet.get(buyer_id).await?;
            if balance < fill_value {
                let max_affordable = floor_decimal(balance / price).to_i64().unwrap_or(0);
                if max_affordable <= 0 {
                    break;
                }
                fill_qty = fill_qty.min(max_affordable);
                fill_value = price * Decimal::from(fill_qty);
            }

            let stock_name = self.catalog.name_for(stock_id).await;
            let credited = self
                .portfolio
                .apply_delta(buyer_id, stock_id, fill_qty, &stock_name)
                .await?;
            if !credited {
                return Err(MatchingError::PortfolioUpdateFailed(buyer_id.to_string()));
            }

            self.wallet.add(&head.user_id, fill_value).await?;
            self.wallet.add(buyer_id, -fill_value).await?;

            let consumed = state.consume_sell(price, head.stock_tx_id, fill_qty);
            if consumed == 0 {
                return Err(MatchingError::Internal(
                    "resting sell vanished while holding the book lock".to_string(),
                ));
            }

            let wallet_tx_id = Uuid::new_v4();
            let now = Utc::now();
            let child_tx_id = Uuid::new_v4();
            let child = StockTransaction {
                stock_tx_id: child_tx_id,
                parent_stock_tx_id: Some(parent_tx_id),
                stock_id: stock_id.to_string(),
                wallet_tx_id: Some(wallet_tx_id),
                user_id: buyer_id.to_string(),
                order_status: OrderStatus::Completed,
                is_buy: true,
                order_type: OrderType::Market,
                stock_price: Some(price),
                quantity: fill_qty,
                remaining_quantity: 0,
                time_stamp: now,
            };
            self.journal.insert_stock_tx(&child).await?;
            self.journal
                .append_wallet_tx(&WalletTransaction {
                    user_id: buyer_id.to_string(),
                    stock_tx_id: child_tx_id,
                    wallet_tx_id,
                    is_debit: true,
                    amount: fill_value,
                    time_stamp: now,
                })
                .await?;
            self.journal
                .append_wallet_tx(&WalletTransaction {
                    user_id: head.user_id.clone(),
                    stock_tx_id: child_tx_id,
                    wallet_tx_id,
                    is_debit: false,
                    amount: fill_value,
                    time_stamp: now,
                })
                .await?;

            fills.push(Fill {
                child_stock_tx_id: child_tx_id,
                wallet_tx_id,
                buyer_id: buyer_id.to_string(),
                seller_id: head.user_id.clone(),
                quantity: fill_qty,
                price,
                time_stamp: now,
            });

            remaining -= fill_qty;
        }

        Ok((remaining, fills))
    }
}
