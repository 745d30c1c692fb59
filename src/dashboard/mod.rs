// Read-only dashboard API over the trade ledger plus live pass-through
// endpoints to the exchange and sentiment sources. No authentication;
// cross-origin unrestricted.

pub mod handlers;
pub mod ws;

use crate::api::{FearGreedClient, UpbitClient};
use crate::db::TradeLedger;
use crate::Result;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub ledger: TradeLedger,
    pub exchange: UpbitClient,
    pub fear_greed: FearGreedClient,
    pub market: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/trades", get(handlers::get_trades))
        .route("/api/trades/:trade_id", get(handlers::get_trade))
        .route("/api/statistics", get(handlers::get_statistics))
        .route("/api/portfolio", get(handlers::get_portfolio))
        .route("/api/market", get(handlers::get_market))
        .route("/api/indicators", get(handlers::get_indicators))
        .route("/api/fear-greed", get(handlers::get_fear_greed))
        .route("/api/reflections", get(handlers::get_reflections))
        .route("/api/chart/ohlcv", get(handlers::get_ohlcv))
        .route("/ws/market", get(ws::ws_market))
        .route("/ws/trades", get(ws::ws_trades))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, port: u16) -> Result<()> {
    let app = router(state);
    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Dashboard API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
