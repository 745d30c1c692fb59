use btcbot::api::upbit::{Credentials, UpbitClient};
use btcbot::api::{FearGreedClient, NewsClient};
use btcbot::chart::ChartCapturer;
use btcbot::db::TradeLedger;
use btcbot::engine::{DecisionEngine, TradingCycle};
use btcbot::execution::OrderExecutor;
use btcbot::llm::OpenAiClient;
use btcbot::reflection::ReflectionGenerator;
use btcbot::sentiment::SentimentCollector;
use btcbot::Config;
use clap::Parser;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "btcbot", about = "LLM-assisted Bitcoin trading bot")]
struct Args {
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Gather data and decide, but never submit orders
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> btcbot::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();
    let config = Config::from_env();

    tracing::info!("btcbot starting on {}", config.market);
    if args.dry_run {
        tracing::info!("Dry-run mode: orders will be planned but not submitted");
    }

    let (access_key, secret_key) = config.upbit_keys()?;
    let exchange = UpbitClient::new(Some(Credentials {
        access_key: access_key.to_string(),
        secret_key: secret_key.to_string(),
    }));
    let openai = OpenAiClient::new(config.openai_key()?.to_string());

    let news = config.serp_api_key.clone().map(NewsClient::new);
    let sentiment = SentimentCollector::new(FearGreedClient::new(), news);
    let chart = ChartCapturer::new(config.webdriver_url.clone(), config.chart_url.clone());
    let engine = DecisionEngine::new(openai.clone());
    let executor = OrderExecutor::new(
        config.market.clone(),
        config.min_order_krw,
        config.fee_buffer,
    );
    let reflections = ReflectionGenerator::new(openai);
    let ledger = TradeLedger::connect(&config.database_url).await?;

    let cycle_interval = Duration::from_secs(config.cycle_interval_secs);
    let retry_delay = Duration::from_secs(config.retry_delay_secs);

    let cycle = TradingCycle::new(
        config,
        exchange,
        sentiment,
        chart,
        engine,
        executor,
        reflections,
        ledger,
        args.dry_run,
    );

    if args.once {
        let row_id = cycle.run().await?;
        tracing::info!("Single cycle complete (trade {})", row_id);
        return Ok(());
    }

    // Steady cadence with a short retry delay after a failed cycle. No retry
    // cap and no backoff growth: a persistent outage keeps retrying at the
    // short interval until it clears.
    loop {
        let delay = match cycle.run().await {
            Ok(row_id) => {
                tracing::info!(
                    "Cycle complete (trade {}), next in {:?}",
                    row_id,
                    cycle_interval
                );
                cycle_interval
            }
            Err(e) => {
                tracing::error!("Cycle failed: {} - retrying in {:?}", e, retry_delay);
                retry_delay
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }

    tracing::info!("btcbot stopped");
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "btcbot=info".into()),
        )
        .init();
}
