// One full decision-and-execution cycle: gather market data, sentiment and
// a chart snapshot, ask the model, place (at most) one order, log the
// result, then reflect on past trades. Fully sequential and blocking; the
// scheduler in main.rs decides when the next cycle runs.

use crate::api::upbit::UpbitClient;
use crate::chart::ChartCapturer;
use crate::config::Config;
use crate::db::{NewTrade, TradeLedger};
use crate::engine::{DecisionContext, DecisionEngine};
use crate::execution::{OrderExecutor, OrderPlan};
use crate::indicators::annotate;
use crate::reflection::ReflectionGenerator;
use crate::sentiment::SentimentCollector;
use crate::Result;
use chrono::Utc;
use std::time::Duration;

const DAILY_CANDLE_COUNT: usize = 30;
const HOURLY_CANDLE_COUNT: usize = 24;
const PROMPT_REFLECTION_LIMIT: i64 = 5;
// brief pause before re-reading balances so the fill is reflected
const POST_TRADE_DELAY: Duration = Duration::from_secs(1);

pub struct TradingCycle {
    config: Config,
    exchange: UpbitClient,
    sentiment: SentimentCollector,
    chart: ChartCapturer,
    engine: DecisionEngine,
    executor: OrderExecutor,
    reflections: ReflectionGenerator,
    ledger: TradeLedger,
    dry_run: bool,
}

impl TradingCycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        exchange: UpbitClient,
        sentiment: SentimentCollector,
        chart: ChartCapturer,
        engine: DecisionEngine,
        executor: OrderExecutor,
        reflections: ReflectionGenerator,
        ledger: TradeLedger,
        dry_run: bool,
    ) -> Self {
        Self {
            config,
            exchange,
            sentiment,
            chart,
            engine,
            executor,
            reflections,
            ledger,
            dry_run,
        }
    }

    /// Run one cycle to completion. Returns the id of the ledger row written
    /// for this cycle. Any error here is cycle-fatal and handled by the
    /// scheduler; sentiment degradation is absorbed before this level.
    pub async fn run(&self) -> Result<i64> {
        let market = &self.config.market;

        // 1. account state and market data
        let balances = self.exchange.balances().await?;
        tracing::info!(
            "Balances: {:.0} KRW, {:.8} BTC (avg {:.0})",
            balances.krw_balance,
            balances.btc_balance,
            balances.btc_avg_buy_price
        );
        let orderbook = self.exchange.orderbook(market).await?;
        let daily = annotate(&self.exchange.daily_candles(market, DAILY_CANDLE_COUNT).await?);
        let hourly = annotate(
            &self
                .exchange
                .hourly_candles(market, HOURLY_CANDLE_COUNT)
                .await?,
        );

        // 2. sentiment (degrades to N/A internally)
        let sentiment = self.sentiment.collect().await;

        // 3. chart snapshot (fatal on failure, session always torn down)
        let chart_image = self.chart.capture().await?;

        // 4. operator strategy notes and prior reflections
        let strategy_text = tokio::fs::read_to_string(&self.config.strategy_file).await?;
        let past_reflections = self
            .ledger
            .past_reflection_texts(PROMPT_REFLECTION_LIMIT)
            .await?;

        // 5. the decision itself
        let decision = self
            .engine
            .decide(
                &DecisionContext {
                    balances: &balances,
                    orderbook: &orderbook,
                    daily: &daily,
                    hourly: &hourly,
                    sentiment: &sentiment,
                    strategy_text: &strategy_text,
                    past_reflections: &past_reflections,
                },
                &chart_image,
            )
            .await?;

        // 6. order execution
        let plan = self.executor.plan(&decision, &balances, orderbook.best_ask());
        if self.dry_run {
            tracing::info!("Dry run: skipping order submission for {:?}", plan);
        } else {
            self.executor.execute(&self.exchange, &plan).await?;
        }

        // 7. ledger row with post-trade balances
        if matches!(plan, OrderPlan::Buy { .. } | OrderPlan::Sell { .. }) && !self.dry_run {
            tokio::time::sleep(POST_TRADE_DELAY).await;
        }
        let post_balances = self.exchange.balances().await?;
        let current_price = self.exchange.current_price(market).await?;

        let row_id = self
            .ledger
            .insert(&NewTrade {
                timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                decision: decision.decision.as_str().to_string(),
                reason: decision.reason.clone(),
                percentage: decision.percentage,
                btc_balance: post_balances.btc_balance,
                krw_balance: post_balances.krw_balance,
                btc_avg_buy_price: post_balances.btc_avg_buy_price,
                btc_krw_price: current_price,
            })
            .await?;
        tracing::info!("Cycle logged as trade {}", row_id);

        // 8. reflect on recent unreflected trades (per-row isolation inside)
        let written = self
            .reflections
            .run(&self.ledger, current_price, sentiment.fear_greed.as_ref())
            .await;
        if written > 0 {
            tracing::info!("Generated {} reflections", written);
        }

        Ok(row_id)
    }
}
