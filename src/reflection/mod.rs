// Post-hoc reflection generation.
//
// For recent ledger rows without a reflection, asks the model to critique
// the decision against the price move since the trade. Each row is handled
// independently: one failure never blocks the rest.

use crate::db::TradeLedger;
use crate::llm::OpenAiClient;
use crate::models::{FearGreed, TradeRecord};

/// How many recent rows are considered each cycle
const LOOKBACK: i64 = 5;

pub struct ReflectionGenerator {
    llm: OpenAiClient,
}

impl ReflectionGenerator {
    pub fn new(llm: OpenAiClient) -> Self {
        Self { llm }
    }

    /// Generate and persist reflections for unreflected recent trades.
    /// Returns how many rows were annotated.
    pub async fn run(
        &self,
        ledger: &TradeLedger,
        current_price: f64,
        fear_greed: Option<&FearGreed>,
    ) -> usize {
        let candidates = match ledger.reflection_candidates(LOOKBACK).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Failed to load reflection candidates: {}", e);
                return 0;
            }
        };

        let mut written = 0;
        for record in candidates {
            let prompt = build_prompt(&record, current_price, fear_greed);
            match self.llm.complete_text(&prompt).await {
                Ok(text) => match ledger.update_reflection(record.id, &text).await {
                    Ok(true) => {
                        tracing::info!(
                            "Reflection added for trade {}: {}...",
                            record.id,
                            text.chars().take(80).collect::<String>()
                        );
                        written += 1;
                    }
                    Ok(false) => {
                        tracing::debug!("Trade {} already reflected, skipping", record.id);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to store reflection for trade {}: {}", record.id, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Reflection generation failed for trade {}: {}", record.id, e);
                }
            }
        }
        written
    }
}

fn build_prompt(record: &TradeRecord, current_price: f64, fear_greed: Option<&FearGreed>) -> String {
    let price_change = if record.btc_krw_price > 0.0 {
        format!(
            "{:.2}%",
            (current_price - record.btc_krw_price) / record.btc_krw_price * 100.0
        )
    } else {
        "N/A".to_string()
    };
    let fear_greed = match fear_greed {
        Some(index) => format!("{} ({})", index.value, index.classification),
        None => "N/A".to_string(),
    };

    format!(
        "You are an expert Bitcoin investor. Analyze the following trade data and current market \
         conditions. Write a reflection journal that explains the trade decision, its outcome, and \
         what could be improved in future decisions:\n\n\
         Trade ID: {}\n\
         Timestamp: {}\n\
         Decision: {}\n\
         Reason: {}\n\
         Percentage: {}%\n\
         BTC balance: {}\n\
         KRW balance: {}\n\
         BTC average buy price: {}\n\
         BTC price at trade: {}\n\
         Current BTC price: {}\n\
         Price change since trade: {}\n\
         Fear and Greed Index: {}\n\n\
         Reflect on whether the decision to {} was correct or incorrect. Provide suggestions for \
         improving future decisions based on the market conditions and the Fear and Greed Index.",
        record.id,
        record.timestamp,
        record.decision,
        record.reason,
        record.percentage,
        record.btc_balance,
        record.krw_balance,
        record.btc_avg_buy_price,
        record.btc_krw_price,
        current_price,
        price_change,
        fear_greed,
        record.decision,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewTrade;

    fn record(price: f64) -> TradeRecord {
        TradeRecord {
            id: 7,
            timestamp: "2024-10-01 12:00:00".to_string(),
            decision: "buy".to_string(),
            reason: "dip".to_string(),
            percentage: 30,
            btc_balance: 0.01,
            krw_balance: 1_000_000.0,
            btc_avg_buy_price: price,
            btc_krw_price: price,
            reflection: None,
        }
    }

    #[test]
    fn test_prompt_includes_drift() {
        let prompt = build_prompt(&record(100_000_000.0), 110_000_000.0, None);
        assert!(prompt.contains("Price change since trade: 10.00%"));
        assert!(prompt.contains("Fear and Greed Index: N/A"));
        assert!(prompt.contains("the decision to buy"));
    }

    #[test]
    fn test_zero_recorded_price_has_no_drift() {
        let prompt = build_prompt(&record(0.0), 110_000_000.0, None);
        assert!(prompt.contains("Price change since trade: N/A"));
    }

    #[tokio::test]
    async fn test_one_bad_row_does_not_block_the_rest() {
        // LLM endpoint that always fails: run() must still visit every
        // candidate and leave the ledger untouched
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .expect_at_least(2)
            .create_async()
            .await;

        let ledger = TradeLedger::connect("sqlite::memory:").await.unwrap();
        for day in 1..=2 {
            ledger
                .insert(&NewTrade {
                    timestamp: format!("2024-10-0{} 00:00:00", day),
                    decision: "hold".to_string(),
                    reason: "test".to_string(),
                    percentage: 0,
                    btc_balance: 0.0,
                    krw_balance: 0.0,
                    btc_avg_buy_price: 0.0,
                    btc_krw_price: 95_000_000.0,
                })
                .await
                .unwrap();
        }

        let generator = ReflectionGenerator::new(crate::llm::OpenAiClient::with_base_url(
            &server.url(),
            "k".to_string(),
        ));
        let written = generator.run(&ledger, 95_000_000.0, None).await;
        assert_eq!(written, 0);
        assert_eq!(ledger.reflection_candidates(5).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reflections_persisted_once() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Good entry."}}]
        })
        .to_string();
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let ledger = TradeLedger::connect("sqlite::memory:").await.unwrap();
        let id = ledger
            .insert(&NewTrade {
                timestamp: "2024-10-01 00:00:00".to_string(),
                decision: "buy".to_string(),
                reason: "test".to_string(),
                percentage: 10,
                btc_balance: 0.0,
                krw_balance: 0.0,
                btc_avg_buy_price: 0.0,
                btc_krw_price: 95_000_000.0,
            })
            .await
            .unwrap();

        let generator = ReflectionGenerator::new(crate::llm::OpenAiClient::with_base_url(
            &server.url(),
            "k".to_string(),
        ));
        assert_eq!(generator.run(&ledger, 96_000_000.0, None).await, 1);
        // a second pass finds no candidates
        assert_eq!(generator.run(&ledger, 96_000_000.0, None).await, 0);

        let record = ledger.trade_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.reflection.as_deref(), Some("Good entry."));
    }
}
