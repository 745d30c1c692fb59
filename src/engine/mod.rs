// Decision engine: turns one cycle's gathered context into a structured
// buy/sell/hold decision via the language model. Stateless between cycles:
// everything it sees is passed in.

pub mod cycle;

pub use cycle::TradingCycle;

use crate::api::upbit::{Balances, OrderBook};
use crate::indicators::AnnotatedSeries;
use crate::llm::OpenAiClient;
use crate::models::{Decision, SentimentSnapshot};
use crate::Result;

const SYSTEM_PROMPT: &str = "You are an expert in Bitcoin investing. Analyze the provided data \
including technical indicators, the Fear and Greed Index, and the latest Bitcoin news headlines. \
Tell me whether to buy, sell, or hold at the moment. Consider the following in your analysis:
- Bollinger Bands (bb_mavg, bb_hband, bb_lband)
- RSI (rsi)
- MACD (macd, macd_signal, macd_diff)
- Moving Averages (sma_20, ema_12)
- Fear and Greed Index (value, classification)
- Latest Bitcoin news headlines with publication time
- The operator's trading strategy notes
- The chart image
- Past trade reflections

Cross-check any signals from the indicators against the strategy notes. If the indicators suggest \
one action but the notes suggest caution, prioritize the notes.

Respond in JSON with three fields: 'decision', 'reason', and 'percentage'. The 'percentage' field \
must be an integer between 0 and 100: the percentage of available KRW to use for a 'buy', or the \
percentage of held BTC to sell for a 'sell'.";

/// Everything the model is shown for one decision
pub struct DecisionContext<'a> {
    pub balances: &'a Balances,
    pub orderbook: &'a OrderBook,
    pub daily: &'a AnnotatedSeries,
    pub hourly: &'a AnnotatedSeries,
    pub sentiment: &'a SentimentSnapshot,
    pub strategy_text: &'a str,
    pub past_reflections: &'a [String],
}

pub struct DecisionEngine {
    llm: OpenAiClient,
}

impl DecisionEngine {
    pub fn new(llm: OpenAiClient) -> Self {
        Self { llm }
    }

    /// One structured decision call. A schema or parse failure propagates;
    /// no partial decision is ever returned.
    pub async fn decide(
        &self,
        context: &DecisionContext<'_>,
        chart_image_base64: &str,
    ) -> Result<Decision> {
        let user_text = build_user_text(context)?;
        let decision = self
            .llm
            .decide(SYSTEM_PROMPT, &user_text, chart_image_base64)
            .await?;

        tracing::info!(
            "AI decision: {} ({}%) - {}",
            decision.decision.as_str().to_uppercase(),
            decision.percentage,
            decision.reason
        );
        Ok(decision)
    }
}

fn build_user_text(context: &DecisionContext<'_>) -> Result<String> {
    let fear_greed = match &context.sentiment.fear_greed {
        Some(index) => format!("{} ({})", index.value, index.classification),
        None => "N/A".to_string(),
    };
    let headlines = match &context.sentiment.headlines {
        Some(headlines) => serde_json::to_string(headlines)?,
        None => "N/A".to_string(),
    };
    let reflections = if context.past_reflections.is_empty() {
        "N/A".to_string()
    } else {
        serde_json::to_string(context.past_reflections)?
    };

    Ok(format!(
        "Current investment status: {}\n\
         Orderbook: {}\n\
         Daily OHLCV with indicators ({} days): {}\n\
         Hourly OHLCV with indicators ({} hours): {}\n\
         Fear and Greed Index: {}\n\
         Latest News Headlines: {}\n\
         Trading Strategy Notes: {}\n\
         Past Trade Reflections: {}",
        serde_json::to_string(context.balances)?,
        serde_json::to_string(context.orderbook)?,
        context.daily.candles.len(),
        serde_json::to_string(&context.daily.to_json_rows())?,
        context.hourly.candles.len(),
        serde_json::to_string(&context.hourly.to_json_rows())?,
        fear_greed,
        headlines,
        context.strategy_text,
        reflections,
    ))
}
