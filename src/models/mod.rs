use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One OHLCV period. Series are ordered ascending by time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// What the model told us to do
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
            TradeAction::Hold => "hold",
        }
    }
}

impl std::str::FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            "hold" => Ok(TradeAction::Hold),
            other => Err(format!("unknown trade action: {}", other)),
        }
    }
}

/// Structured model output for one cycle.
///
/// `percentage` is the fraction of available KRW to spend on a buy, or the
/// fraction of held BTC to sell. Range is enforced by the executor, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision: TradeAction,
    pub reason: String,
    pub percentage: i64,
}

/// Latest fear & greed index reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FearGreed {
    pub value: u32,
    pub classification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsHeadline {
    pub title: String,
    pub published_at: String,
}

/// Sentiment inputs for one cycle. `None` means the source was unavailable
/// this cycle; the prompt substitutes "N/A".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SentimentSnapshot {
    pub fear_greed: Option<FearGreed>,
    pub headlines: Option<Vec<NewsHeadline>>,
}

/// One persisted decision cycle. Append-only: after insert only `reflection`
/// is ever written, and only once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: i64,
    pub timestamp: String,
    pub decision: String,
    pub reason: String,
    pub percentage: i64,
    pub btc_balance: f64,
    pub krw_balance: f64,
    pub btc_avg_buy_price: f64,
    pub btc_krw_price: f64,
    pub reflection: Option<String>,
}

impl TradeRecord {
    /// Total account value in quote currency at the time of this record
    pub fn total_value_krw(&self) -> f64 {
        self.krw_balance + self.btc_balance * self.btc_krw_price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeStatistics {
    pub total_trades: i64,
    pub decision_counts: HashMap<String, i64>,
    pub first_trade_date: Option<String>,
    pub last_trade_date: Option<String>,
    pub latest_trade: Option<TradeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPerformance {
    pub current_btc_balance: f64,
    pub current_krw_balance: f64,
    pub btc_avg_buy_price: f64,
    pub current_btc_price: f64,
    pub total_value_krw: f64,
    pub initial_value_krw: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
}
