pub mod ledger;

pub use ledger::{NewTrade, ReflectionSummary, TradeLedger};
