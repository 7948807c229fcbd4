pub mod order;
pub mod prices;
pub mod transactions;
pub mod wallet;
