use btcbot::api::upbit::Balances;
use btcbot::db::{NewTrade, TradeLedger};
use btcbot::execution::{ExecutionOutcome, OrderExecutor, OrderPlan, RejectReason};
use btcbot::indicators::{annotate, RSI_WINDOW};
use btcbot::models::{Candle, Decision, TradeAction};
use chrono::{TimeZone, Utc};

fn daily_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
                + chrono::Duration::days(i as i64),
            open: close * 0.995,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 12.5,
        })
        .collect()
}

fn new_trade(timestamp: &str, decision: &str, krw: f64, btc: f64, price: f64) -> NewTrade {
    NewTrade {
        timestamp: timestamp.to_string(),
        decision: decision.to_string(),
        reason: "e2e".to_string(),
        percentage: 25,
        btc_balance: btc,
        krw_balance: krw,
        btc_avg_buy_price: price,
        btc_krw_price: price,
    }
}

/// Scenario A: 30 strictly rising daily closes must leave the final RSI in
/// overbought territory.
#[test]
fn test_rising_market_is_overbought() {
    let closes: Vec<f64> = (0..30).map(|i| 90_000_000.0 + i as f64 * 250_000.0).collect();
    let series = annotate(&daily_candles(&closes));

    let last_rsi = series.indicators.last().unwrap().rsi.unwrap();
    assert!(
        last_rsi > 70.0,
        "expected overbought RSI, got {:.1}",
        last_rsi
    );
    // warm-up prefix stays undefined even in a clean uptrend
    for row in &series.indicators[..RSI_WINDOW] {
        assert!(row.rsi.is_none());
    }
}

/// Indicator determinism: identical candles in, identical values out.
#[test]
fn test_indicators_are_deterministic() {
    let closes: Vec<f64> = (0..30)
        .map(|i| 90_000_000.0 + ((i * 13) % 7) as f64 * 400_000.0)
        .collect();
    let candles = daily_candles(&closes);

    let first = annotate(&candles);
    let second = annotate(&candles);
    assert_eq!(first.indicators, second.indicators);
}

/// Scenario B: an out-of-range percentage is flagged before any exchange
/// call, and the cycle still reaches balance logging.
#[tokio::test]
async fn test_invalid_percentage_never_reaches_exchange() {
    let executor = OrderExecutor::new("KRW-BTC".to_string(), 5000.0, 0.9995);
    let decision = Decision {
        decision: TradeAction::Buy,
        reason: "over-eager model output".to_string(),
        percentage: 101,
    };
    let balances = Balances {
        btc_balance: 0.0,
        krw_balance: 10_000_000.0,
        btc_avg_buy_price: 0.0,
    };

    let plan = executor.plan(&decision, &balances, Some(95_100_000.0));
    assert_eq!(plan, OrderPlan::Reject(RejectReason::InvalidPercentage(101)));

    // executing the rejection performs no exchange call: the client points
    // at an unroutable address, so any request would fail loudly
    let exchange = btcbot::api::UpbitClient::with_base_url("http://127.0.0.1:1", None);
    let outcome = executor.execute(&exchange, &plan).await.unwrap();
    assert!(matches!(outcome, ExecutionOutcome::NotPlaced(_)));

    // the cycle proceeds to balance logging regardless
    let ledger = TradeLedger::connect("sqlite::memory:").await.unwrap();
    let row_id = ledger
        .insert(&new_trade(
            "2024-10-01 12:00:00",
            "buy",
            10_000_000.0,
            0.0,
            95_000_000.0,
        ))
        .await
        .unwrap();
    assert_eq!(
        ledger.trade_by_id(row_id).await.unwrap().unwrap().percentage,
        25
    );
}

/// Scenario C: ledger statistics over five known decisions.
#[tokio::test]
async fn test_ledger_statistics_histogram() {
    let ledger = TradeLedger::connect("sqlite::memory:").await.unwrap();
    for (i, decision) in ["buy", "hold", "sell", "buy", "hold"].iter().enumerate() {
        ledger
            .insert(&new_trade(
                &format!("2024-10-0{} 08:00:00", i + 1),
                decision,
                1_000_000.0,
                0.0,
                95_000_000.0,
            ))
            .await
            .unwrap();
    }

    let stats = ledger.statistics().await.unwrap();
    assert_eq!(stats.total_trades, 5);
    assert_eq!(stats.decision_counts["buy"], 2);
    assert_eq!(stats.decision_counts["hold"], 2);
    assert_eq!(stats.decision_counts["sell"], 1);
}

/// Scenario D: portfolio performance from a seeded first row and a higher
/// later row reports a positive, internally consistent profit.
#[tokio::test]
async fn test_portfolio_performance_consistency() {
    let ledger = TradeLedger::connect("sqlite::memory:").await.unwrap();
    ledger
        .insert(&new_trade(
            "2024-10-01 00:00:00",
            "buy",
            5_000_000.0,
            0.01,
            95_000_000.0,
        ))
        .await
        .unwrap();
    ledger
        .insert(&new_trade(
            "2024-10-05 00:00:00",
            "hold",
            5_200_000.0,
            0.01,
            101_000_000.0,
        ))
        .await
        .unwrap();

    let perf = ledger.portfolio_performance().await.unwrap();
    assert_eq!(perf.initial_value_krw, 5_000_000.0 + 0.01 * 95_000_000.0);
    assert!(perf.profit_loss > 0.0);
    assert!(
        (perf.profit_loss_percentage - perf.profit_loss / perf.initial_value_krw * 100.0).abs()
            < 1e-9
    );
}

/// Buy sizing property: notional = balance x pct/100 x 0.9995, submitted iff
/// above the 5000 KRW minimum.
#[test]
fn test_buy_notional_gate() {
    let executor = OrderExecutor::new("KRW-BTC".to_string(), 5000.0, 0.9995);
    let balances = |krw: f64| Balances {
        btc_balance: 0.0,
        krw_balance: krw,
        btc_avg_buy_price: 0.0,
    };
    let buy = |pct: i64| Decision {
        decision: TradeAction::Buy,
        reason: "sizing".to_string(),
        percentage: pct,
    };

    match executor.plan(&buy(40), &balances(2_000_000.0), None) {
        OrderPlan::Buy { notional } => {
            assert!((notional - 2_000_000.0 * 0.4 * 0.9995).abs() < 1e-9)
        }
        other => panic!("expected buy, got {:?}", other),
    }

    // 12,000 * 40% * 0.9995 = 4797.6, below the gate
    assert!(matches!(
        executor.plan(&buy(40), &balances(12_000.0), None),
        OrderPlan::Reject(RejectReason::BuyBelowMinimum { .. })
    ));
}

/// Sell sizing property: value = balance x pct/100 x best ask, same gate.
#[test]
fn test_sell_notional_gate() {
    let executor = OrderExecutor::new("KRW-BTC".to_string(), 5000.0, 0.9995);
    let balances = Balances {
        btc_balance: 0.004,
        krw_balance: 0.0,
        btc_avg_buy_price: 0.0,
    };
    let sell = |pct: i64| Decision {
        decision: TradeAction::Sell,
        reason: "sizing".to_string(),
        percentage: pct,
    };

    match executor.plan(&sell(50), &balances, Some(95_000_000.0)) {
        OrderPlan::Sell { volume, value } => {
            assert!((volume - 0.002).abs() < 1e-12);
            assert!((value - 190_000.0).abs() < 1e-6);
        }
        other => panic!("expected sell, got {:?}", other),
    }

    // 0.004 * 1% * 95M = 3800 KRW, below the gate
    assert!(matches!(
        executor.plan(&sell(1), &balances, Some(95_000_000.0)),
        OrderPlan::Reject(RejectReason::SellBelowMinimum { .. })
    ));
}

/// Reflection idempotence across the public ledger API.
#[tokio::test]
async fn test_reflection_never_overwritten() {
    let ledger = TradeLedger::connect("sqlite::memory:").await.unwrap();
    let id = ledger
        .insert(&new_trade(
            "2024-10-01 00:00:00",
            "sell",
            1_000_000.0,
            0.0,
            95_000_000.0,
        ))
        .await
        .unwrap();

    assert!(ledger.update_reflection(id, "original take").await.unwrap());
    assert!(!ledger.update_reflection(id, "revisionism").await.unwrap());
    assert_eq!(
        ledger
            .trade_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .reflection
            .as_deref(),
        Some("original take")
    );
}
