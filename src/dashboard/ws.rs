// Push channels. Each connection runs its own polling loop and is torn down
// when the client goes away; errors are contained per connection.

use crate::dashboard::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;

const PRICE_PUSH_INTERVAL: Duration = Duration::from_secs(1);
const TRADE_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub async fn ws_market(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| market_stream(socket, state))
}

pub async fn ws_trades(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| trade_stream(socket, state))
}

/// Latest price once per second until the client disconnects
async fn market_stream(mut socket: WebSocket, state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(PRICE_PUSH_INTERVAL);
    loop {
        ticker.tick().await;

        let price = match state.exchange.current_price(&state.market).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!("Price push: exchange fetch failed: {}", e);
                continue;
            }
        };

        let message = serde_json::json!({
            "type": "market_update",
            "data": {
                "price": price,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        });
        if socket.send(Message::Text(message.to_string())).await.is_err() {
            break; // client went away
        }
    }
    tracing::debug!("Market stream closed");
}

/// Poll the ledger every 5 seconds and push a row when the latest id changes
async fn trade_stream(mut socket: WebSocket, state: Arc<AppState>) {
    let mut last_trade_id: Option<i64> = None;
    let mut ticker = tokio::time::interval(TRADE_POLL_INTERVAL);
    loop {
        ticker.tick().await;

        let latest = match state.ledger.latest_trade().await {
            Ok(latest) => latest,
            Err(e) => {
                tracing::warn!("Trade push: ledger read failed: {}", e);
                continue;
            }
        };

        let Some(trade) = latest else { continue };
        if last_trade_id == Some(trade.id) {
            continue;
        }
        last_trade_id = Some(trade.id);

        let message = serde_json::json!({
            "type": "new_trade",
            "data": trade,
        });
        if socket.send(Message::Text(message.to_string())).await.is_err() {
            break;
        }
    }
    tracing::debug!("Trade stream closed");
}
