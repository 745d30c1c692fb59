// External HTTP clients
pub mod fear_greed;
pub mod news;
pub mod upbit;

pub use fear_greed::FearGreedClient;
pub use news::NewsClient;
pub use upbit::{Balances, CandleInterval, Credentials, OrderBook, UpbitClient};
