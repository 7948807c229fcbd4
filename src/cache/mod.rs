pub mod redis_client;
pub mod wallet_ledger;

pub use redis_client::{RedisClient, RedisConfig};
pub use wallet_ledger::RedisWalletLedger;
