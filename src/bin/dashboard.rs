use btcbot::api::{FearGreedClient, UpbitClient};
use btcbot::dashboard::{self, AppState};
use btcbot::db::TradeLedger;
use btcbot::Config;
use std::sync::Arc;

#[tokio::main]
async fn main() -> btcbot::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "btcbot=info,dashboard=info".into()),
        )
        .init();

    let config = Config::from_env();
    let ledger = TradeLedger::connect(&config.database_url).await?;

    // reads the same ledger the bot writes; market data via keyless client
    let state = Arc::new(AppState {
        ledger,
        exchange: UpbitClient::public(),
        fear_greed: FearGreedClient::new(),
        market: config.market.clone(),
    });

    dashboard::serve(state, config.dashboard_port).await
}
