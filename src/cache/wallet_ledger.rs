//! Redis-backed `WalletLedgerPort` (§4.8): the Wallet Ledger is the single
//! source of truth for balances (§9), keyed `wallet_balance:{user_id}`,
//! exactly matching the Python reference's key scheme. Every operation
//! rides the teacher's `RedisClient::with_retry` bounded backoff so a
//! transient Redis hiccup does not abort a fill step outright (§5).

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::cache::redis_client::RedisClient;
use crate::services::matching::{MatchingError, WalletLedgerPort};

fn balance_key(user_id: &str) -> String {
    format!("wallet_balance:{user_id}")
}

pub struct RedisWalletLedger {
    redis: RedisClient,
}

impl RedisWalletLedger {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl WalletLedgerPort for RedisWalletLedger {
    async fn get(&self, user_id: &str) -> Result<Decimal, MatchingError> {
        let raw: Option<String> = self.redis.get(&balance_key(user_id)).await?;
        match raw {
            Some(value) => Decimal::from_str(&value)
                .map_err(|e| MatchingError::Dependency(format!("corrupt wallet balance: {e}"))),
            None => Ok(Decimal::ZERO),
        }
    }

    async fn add(&self, user_id: &str, delta: Decimal) -> Result<(), MatchingError> {
        let key = balance_key(user_id);
        if !self.redis.exists(&key).await? {
            // First touch: seed at zero so INCRBYFLOAT has a numeric base
            // rather than creating the key from the increment string itself.
            self.redis.set::<String>(&key, "0".to_string(), None).await?;
        }
        self.redis.incr_float(&key, delta.to_string()).await?;
        Ok(())
    }
}
