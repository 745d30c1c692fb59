use crate::api::upbit::CandleInterval;
use crate::dashboard::AppState;
use crate::indicators::{annotate, IndicatorRow};
use crate::models::{FearGreed, PortfolioPerformance, TradeRecord, TradeStatistics};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OhlcvQuery {
    pub interval: Option<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MarketSnapshot {
    pub current_price: f64,
    pub timestamp: String,
    pub change_24h: Option<f64>,
    pub volume_24h: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OhlcvResponse {
    pub interval: String,
    pub count: usize,
    pub data: Vec<serde_json::Value>,
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "AI Bitcoin Trading Dashboard API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "trades": "/api/trades",
            "statistics": "/api/statistics",
            "portfolio": "/api/portfolio",
            "market": "/api/market",
            "indicators": "/api/indicators",
            "fear-greed": "/api/fear-greed",
            "reflections": "/api/reflections",
            "ohlcv": "/api/chart/ohlcv"
        }
    }))
}

pub async fn get_trades(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<TradeRecord>>, StatusCode> {
    let limit = query.limit.unwrap_or(100);
    match state.ledger.all_trades(Some(limit)).await {
        Ok(trades) => Ok(Json(trades)),
        Err(e) => {
            warn!("Failed to list trades: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    Path(trade_id): Path<i64>,
) -> Result<Json<TradeRecord>, StatusCode> {
    match state.ledger.trade_by_id(trade_id).await {
        Ok(Some(trade)) => Ok(Json(trade)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            warn!("Failed to load trade {}: {}", trade_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TradeStatistics>, StatusCode> {
    match state.ledger.statistics().await {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => {
            warn!("Failed to compute statistics: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_portfolio(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PortfolioPerformance>, StatusCode> {
    match state.ledger.portfolio_performance().await {
        Ok(performance) => Ok(Json(performance)),
        Err(e) => {
            warn!("Failed to compute portfolio performance: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_market(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MarketSnapshot>, StatusCode> {
    let current_price = match state.exchange.current_price(&state.market).await {
        Ok(price) => price,
        Err(e) => {
            warn!("Failed to fetch current price: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // 24h change against yesterday's daily close; absent when unavailable
    let (change_24h, volume_24h) = match state.exchange.daily_candles(&state.market, 2).await {
        Ok(candles) if candles.len() >= 2 => {
            let yesterday_close = candles[candles.len() - 2].close;
            let change = (current_price - yesterday_close) / yesterday_close * 100.0;
            (Some(change), candles.last().map(|c| c.volume))
        }
        Ok(candles) => (None, candles.last().map(|c| c.volume)),
        Err(e) => {
            warn!("Failed to fetch daily candles for market snapshot: {}", e);
            (None, None)
        }
    };

    Ok(Json(MarketSnapshot {
        current_price,
        timestamp: chrono::Utc::now().to_rfc3339(),
        change_24h,
        volume_24h,
    }))
}

pub async fn get_indicators(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IndicatorRow>, StatusCode> {
    let candles = match state.exchange.daily_candles(&state.market, 30).await {
        Ok(candles) => candles,
        Err(e) => {
            warn!("Failed to fetch candles for indicators: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let series = annotate(&candles);
    match series.indicators.last() {
        Some(row) => Ok(Json(row.clone())),
        None => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub async fn get_fear_greed(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FearGreed>, StatusCode> {
    match state.fear_greed.latest().await {
        Ok(index) => Ok(Json(index)),
        Err(e) => {
            warn!("Failed to fetch fear & greed index: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_reflections(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<crate::db::ReflectionSummary>>, StatusCode> {
    let limit = query.limit.unwrap_or(5);
    match state.ledger.recent_reflections(limit).await {
        Ok(reflections) => Ok(Json(reflections)),
        Err(e) => {
            warn!("Failed to list reflections: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_ohlcv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OhlcvQuery>,
) -> Result<Json<OhlcvResponse>, StatusCode> {
    let interval_name = query.interval.unwrap_or_else(|| "day".to_string());
    let count = query.count.unwrap_or(30);

    let interval: CandleInterval = match interval_name.parse() {
        Ok(interval) => interval,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };

    match state.exchange.candles(&state.market, interval, count).await {
        Ok(candles) => {
            let data = candles
                .iter()
                .map(|c| serde_json::to_value(c).unwrap_or_default())
                .collect::<Vec<_>>();
            Ok(Json(OhlcvResponse {
                interval: interval_name,
                count: data.len(),
                data,
            }))
        }
        Err(e) => {
            warn!("Failed to fetch OHLCV data: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
