//! Postgres-backed `PortfolioStorePort`, `TransactionJournalPort`, and
//! `StockCatalogPort` adapters (§4.9). Runtime-checked `sqlx::query`/
//! `query_as` (no compile-time `query!` macros, since there is no live
//! database to check schemas against at build time).

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{StockTransaction, WalletTransaction};
use crate::services::matching::{
    MatchingError, PortfolioStorePort, StockCatalogPort, StockTxPatch, TransactionJournalPort,
};

pub struct PostgresPortfolioStore {
    pool: PgPool,
}

impl PostgresPortfolioStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PortfolioStorePort for PostgresPortfolioStore {
    async fn get_quantity(&self, user_id: &str, stock_id: &str) -> Result<i64, MatchingError> {
        let qty: Option<i64> = sqlx::query_scalar(
            "SELECT quantity_owned FROM portfolios WHERE user_id = $1 AND stock_id = $2",
        )
        .bind(user_id)
        .bind(stock_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(qty.unwrap_or(0))
    }

    /// Upserts on a positive delta (auto-creating the row, seeded with
    /// `stock_name_on_create`), or conditionally decrements an existing row
    /// on a negative delta, failing rather than going negative. Prunes the
    /// row once `quantity_owned` reaches zero, mirroring the Python
    /// reference's increment -> re-check -> prune sequence inside one
    /// transaction (§4.9).
    async fn apply_delta(
        &self,
        user_id: &str,
        stock_id: &str,
        delta: i64,
        stock_name_on_create: &str,
    ) -> Result<bool, MatchingError> {
        let mut tx = self.pool.begin().await?;

        let new_qty: Option<i64> = if delta >= 0 {
            sqlx::query_scalar(
                "INSERT INTO portfolios (user_id, stock_id, stock_name, quantity_owned)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (user_id, stock_id)
                 DO UPDATE SET quantity_owned = portfolios.quantity_owned + EXCLUDED.quantity_owned
                 RETURNING quantity_owned",
            )
            .bind(user_id)
            .bind(stock_id)
            .bind(stock_name_on_create)
            .bind(delta)
            .fetch_optional(&mut *tx)
            .await?
        } else {
            sqlx::query_scalar(
                "UPDATE portfolios SET quantity_owned = quantity_owned + $3
                 WHERE user_id = $1 AND stock_id = $2 AND quantity_owned + $3 >= 0
                 RETURNING quantity_owned",
            )
            .bind(user_id)
            .bind(stock_id)
            .bind(delta)
            .fetch_optional(&mut *tx)
            .await?
        };

        let Some(quantity_owned) = new_qty else {
            tx.rollback().await.ok();
            return Ok(false);
        };

        if quantity_owned == 0 {
            sqlx::query("DELETE FROM portfolios WHERE user_id = $1 AND stock_id = $2")
                .bind(user_id)
                .bind(stock_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

pub struct PostgresTransactionJournal {
    pool: PgPool,
}

impl PostgresTransactionJournal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionJournalPort for PostgresTransactionJournal {
    async fn insert_stock_tx(&self, tx: &StockTransaction) -> Result<(), MatchingError> {
        let result = sqlx::query(
            "INSERT INTO stock_transactions
                (stock_tx_id, parent_stock_tx_id, stock_id, wallet_tx_id, user_id,
                 order_status, is_buy, order_type, stock_price, quantity, remaining_quantity, time_stamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (stock_tx_id) DO NOTHING",
        )
        .bind(tx.stock_tx_id)
        .bind(tx.parent_stock_tx_id)
        .bind(&tx.stock_id)
        .bind(tx.wallet_tx_id)
        .bind(&tx.user_id)
        .bind(tx.order_status)
        .bind(tx.order_type)
        .bind(tx.stock_price)
        .bind(tx.quantity)
        .bind(tx.remaining_quantity)
        .bind(tx.time_stamp)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MatchingError::Conflict(tx.stock_tx_id));
        }
        Ok(())
    }

    async fn update_stock_tx(
        &self,
        stock_tx_id: uuid::Uuid,
        patch: StockTxPatch,
    ) -> Result<(), MatchingError> {
        let result = sqlx::query(
            "UPDATE stock_transactions
             SET order_status = COALESCE($2, order_status),
                 stock_price = COALESCE($3, stock_price),
                 wallet_tx_id = COALESCE($4, wallet_tx_id),
                 remaining_quantity = COALESCE($5, remaining_quantity)
             WHERE stock_tx_id = $1",
        )
        .bind(stock_tx_id)
        .bind(patch.order_status)
        .bind(patch.stock_price)
        .bind(patch.wallet_tx_id)
        .bind(patch.remaining_quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MatchingError::NotFound(stock_tx_id));
        }
        Ok(())
    }

    async fn find_stock_tx(
        &self,
        stock_tx_id: uuid::Uuid,
    ) -> Result<Option<StockTransaction>, MatchingError> {
        let tx = sqlx::query_as::<_, StockTransaction>(
            "SELECT * FROM stock_transactions WHERE stock_tx_id = $1",
        )
        .bind(stock_tx_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tx)
    }

    async fn append_wallet_tx(&self, entry: &WalletTransaction) -> Result<(), MatchingError> {
        sqlx::query(
            "INSERT INTO wallet_transactions (user_id, stock_tx_id, wallet_tx_id, is_debit, amount, time_stamp)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&entry.user_id)
        .bind(entry.stock_tx_id)
        .bind(entry.wallet_tx_id)
        .bind(entry.is_debit)
        .bind(entry.amount)
        .bind(entry.time_stamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_stock_tx_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<StockTransaction>, MatchingError> {
        let txs = sqlx::query_as::<_, StockTransaction>(
            "SELECT * FROM stock_transactions WHERE user_id = $1 ORDER BY time_stamp DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(txs)
    }

    async fn find_child_stock_txs(
        &self,
        parent_stock_tx_id: uuid::Uuid,
    ) -> Result<Vec<StockTransaction>, MatchingError> {
        let txs = sqlx::query_as::<_, StockTransaction>(
            "SELECT * FROM stock_transactions WHERE parent_stock_tx_id = $1",
        )
        .bind(parent_stock_tx_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(txs)
    }

    async fn find_wallet_log(&self, user_id: &str) -> Result<Vec<WalletTransaction>, MatchingError> {
        let entries = sqlx::query_as::<_, WalletTransaction>(
            "SELECT * FROM wallet_transactions WHERE user_id = $1 ORDER BY time_stamp DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}

pub struct PostgresStockCatalog {
    pool: PgPool,
}

impl PostgresStockCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockCatalogPort for PostgresStockCatalog {
    async fn name_for(&self, stock_id: &str) -> String {
        sqlx::query_scalar::<_, String>("SELECT stock_name FROM stocks WHERE stock_id = $1")
            .bind(stock_id)
            .fetch_optional(&self.pool)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| crate::models::stock::UNKNOWN_STOCK_NAME.to_string())
    }
}
