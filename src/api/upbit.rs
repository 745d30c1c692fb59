use crate::models::Candle;
use crate::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::NaiveDateTime;
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

const UPBIT_API_BASE: &str = "https://api.upbit.com";
const RATE_LIMIT_RPS: u32 = 8;

type UpbitRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Exchange access/secret key pair for the account endpoints
#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

/// Upbit REST client.
///
/// Public market-data endpoints work without credentials; account and order
/// endpoints require them and sign each request with a per-request JWT.
/// No retry logic: a transport error propagates to the caller.
#[derive(Clone)]
pub struct UpbitClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    rate_limiter: Arc<UpbitRateLimiter>,
}

/// Candle fetch granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleInterval {
    Minutes(u32),
    Day,
    Week,
    Month,
}

impl CandleInterval {
    fn path(&self) -> String {
        match self {
            CandleInterval::Minutes(unit) => format!("candles/minutes/{}", unit),
            CandleInterval::Day => "candles/days".to_string(),
            CandleInterval::Week => "candles/weeks".to_string(),
            CandleInterval::Month => "candles/months".to_string(),
        }
    }
}

impl std::str::FromStr for CandleInterval {
    type Err = String;

    /// Accepts the dashboard's interval names: "minute1".."minute240",
    /// "day", "week", "month"
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "day" => Ok(CandleInterval::Day),
            "week" => Ok(CandleInterval::Week),
            "month" => Ok(CandleInterval::Month),
            _ => {
                let unit = s
                    .strip_prefix("minute")
                    .and_then(|u| u.parse::<u32>().ok())
                    .filter(|u| [1, 3, 5, 10, 15, 30, 60, 240].contains(u));
                match unit {
                    Some(unit) => Ok(CandleInterval::Minutes(unit)),
                    None => Err(format!("invalid candle interval: {}", s)),
                }
            }
        }
    }
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
struct TickerRaw {
    trade_price: f64,
}

#[derive(Debug, Deserialize)]
struct CandleRaw {
    candle_date_time_utc: String,
    opening_price: f64,
    high_price: f64,
    low_price: f64,
    trade_price: f64,
    candle_acc_trade_volume: f64,
}

#[derive(Debug, Deserialize)]
struct AccountRaw {
    currency: String,
    balance: String,
    avg_buy_price: String,
}

// ============== Public Types ==============

#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct OrderBookUnit {
    pub ask_price: f64,
    pub bid_price: f64,
    pub ask_size: f64,
    pub bid_size: f64,
}

#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct OrderBook {
    pub market: String,
    pub total_ask_size: f64,
    pub total_bid_size: f64,
    pub orderbook_units: Vec<OrderBookUnit>,
}

impl OrderBook {
    /// Lowest ask, used to value sell orders in quote currency
    pub fn best_ask(&self) -> Option<f64> {
        self.orderbook_units.first().map(|u| u.ask_price)
    }
}

/// Per-currency account state. Upbit reports amounts as decimal strings.
#[derive(Debug, Clone)]
pub struct Account {
    pub currency: String,
    pub balance: f64,
    pub avg_buy_price: f64,
}

/// Balances the trading cycle cares about
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Balances {
    pub btc_balance: f64,
    pub krw_balance: f64,
    pub btc_avg_buy_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub uuid: String,
    pub side: String,
    pub ord_type: String,
    pub state: String,
    pub market: String,
}

// ============== Implementation ==============

impl UpbitClient {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self::with_base_url(UPBIT_API_BASE, credentials)
    }

    /// Public-only client for the dashboard's pass-through endpoints
    pub fn public() -> Self {
        Self::new(None)
    }

    pub fn with_base_url(base_url: &str, credentials: Option<Credentials>) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(RATE_LIMIT_RPS).unwrap());
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Current trade price for a market
    /// Endpoint: GET /v1/ticker?markets={market}
    pub async fn current_price(&self, market: &str) -> Result<f64> {
        let url = format!("{}/v1/ticker?markets={}", self.base_url, market);
        let tickers: Vec<TickerRaw> = self.get_json(&url).await?;
        tickers
            .first()
            .map(|t| t.trade_price)
            .ok_or_else(|| format!("no ticker returned for {}", market).into())
    }

    /// Full order book snapshot
    /// Endpoint: GET /v1/orderbook?markets={market}
    pub async fn orderbook(&self, market: &str) -> Result<OrderBook> {
        let url = format!("{}/v1/orderbook?markets={}", self.base_url, market);
        let mut books: Vec<OrderBook> = self.get_json(&url).await?;
        if books.is_empty() {
            return Err(format!("no orderbook returned for {}", market).into());
        }
        Ok(books.remove(0))
    }

    /// Candle series, returned ascending by time (Upbit sends newest first)
    /// Endpoint: GET /v1/{interval path}?market={market}&count={count}
    pub async fn candles(
        &self,
        market: &str,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/v1/{}?market={}&count={}",
            self.base_url,
            interval.path(),
            market,
            count
        );
        let raw: Vec<CandleRaw> = self.get_json(&url).await?;

        let mut candles = Vec::with_capacity(raw.len());
        for row in raw {
            let timestamp =
                NaiveDateTime::parse_from_str(&row.candle_date_time_utc, "%Y-%m-%dT%H:%M:%S")?
                    .and_utc();
            candles.push(Candle {
                timestamp,
                open: row.opening_price,
                high: row.high_price,
                low: row.low_price,
                close: row.trade_price,
                volume: row.candle_acc_trade_volume,
            });
        }
        candles.reverse();
        Ok(candles)
    }

    pub async fn daily_candles(&self, market: &str, count: usize) -> Result<Vec<Candle>> {
        self.candles(market, CandleInterval::Day, count).await
    }

    pub async fn hourly_candles(&self, market: &str, count: usize) -> Result<Vec<Candle>> {
        self.candles(market, CandleInterval::Minutes(60), count).await
    }

    /// All account balances
    /// Endpoint: GET /v1/accounts (signed)
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        let url = format!("{}/v1/accounts", self.base_url);
        let token = self.auth_token(None)?;

        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("Upbit API error: {}", response.status()).into());
        }

        let raw: Vec<AccountRaw> = response.json().await?;
        let mut accounts = Vec::with_capacity(raw.len());
        for account in raw {
            accounts.push(Account {
                currency: account.currency,
                balance: account.balance.parse()?,
                avg_buy_price: account.avg_buy_price.parse()?,
            });
        }
        Ok(accounts)
    }

    /// BTC/KRW balances and average cost, defaulting to zero for currencies
    /// the account has never held
    pub async fn balances(&self) -> Result<Balances> {
        let accounts = self.accounts().await?;
        let mut balances = Balances::default();
        for account in accounts {
            match account.currency.as_str() {
                "BTC" => {
                    balances.btc_balance = account.balance;
                    balances.btc_avg_buy_price = account.avg_buy_price;
                }
                "KRW" => balances.krw_balance = account.balance,
                _ => {}
            }
        }
        Ok(balances)
    }

    /// Market buy spending `notional` of quote currency
    /// Endpoint: POST /v1/orders with ord_type=price (signed)
    pub async fn buy_market_order(&self, market: &str, notional: f64) -> Result<OrderResponse> {
        let query = format!(
            "market={}&ord_type=price&price={}&side=bid",
            market, notional
        );
        self.submit_order(&query).await
    }

    /// Market sell of `volume` base currency
    /// Endpoint: POST /v1/orders with ord_type=market (signed)
    pub async fn sell_market_order(&self, market: &str, volume: f64) -> Result<OrderResponse> {
        let query = format!(
            "market={}&ord_type=market&side=ask&volume={}",
            market, volume
        );
        self.submit_order(&query).await
    }

    async fn submit_order(&self, query: &str) -> Result<OrderResponse> {
        let url = format!("{}/v1/orders?{}", self.base_url, query);
        let token = self.auth_token(Some(query))?;

        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Upbit order rejected ({}): {}", status, body).into());
        }

        Ok(response.json().await?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.rate_limiter.until_ready().await;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(format!("Upbit API error: {}", response.status()).into());
        }

        Ok(response.json().await?)
    }

    /// Per-request JWT: HS256 over {access_key, nonce} plus a SHA512 hash of
    /// the query string when the request has one
    fn auth_token(&self, query: Option<&str>) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or("account endpoint called without exchange credentials")?;

        let mut claims = serde_json::json!({
            "access_key": credentials.access_key,
            "nonce": Uuid::new_v4().to_string(),
        });
        if let Some(query) = query {
            claims["query_hash"] = sha512_hex(query).into();
            claims["query_hash_alg"] = "SHA512".into();
        }

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{}.{}", header, payload);

        let mut mac = Hmac::<Sha256>::new_from_slice(credentials.secret_key.as_bytes())
            .map_err(|e| format!("invalid secret key: {}", e))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }
}

fn sha512_hex(input: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
