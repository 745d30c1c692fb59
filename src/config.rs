use crate::Result;

/// Runtime configuration, loaded once from the environment and passed into
/// each component. Nothing reads env vars after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Trading pair, quote-base (e.g. "KRW-BTC")
    pub market: String,
    pub upbit_access_key: Option<String>,
    pub upbit_secret_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// News search is optional; without a key the collector reports "N/A"
    pub serp_api_key: Option<String>,
    pub database_url: String,
    /// Operator-supplied strategy document fed verbatim into the prompt
    pub strategy_file: String,
    /// WebDriver endpoint for chart capture (chromedriver)
    pub webdriver_url: String,
    pub chart_url: String,
    /// Steady-state seconds between cycles
    pub cycle_interval_secs: u64,
    /// Seconds to wait before resuming after a failed cycle
    pub retry_delay_secs: u64,
    /// Exchange minimum order notional in quote currency
    pub min_order_krw: f64,
    /// Multiplier applied to buy notionals to leave room for fees
    pub fee_buffer: f64,
    pub dashboard_port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            market: env_or("MARKET", "KRW-BTC"),
            upbit_access_key: std::env::var("UPBIT_ACCESS_KEY").ok(),
            upbit_secret_key: std::env::var("UPBIT_SECRET_KEY").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            serp_api_key: std::env::var("SERP_API_KEY").ok(),
            database_url: env_or("DATABASE_URL", "sqlite:ai_trading.db?mode=rwc"),
            strategy_file: env_or("STRATEGY_FILE", "strategy.txt"),
            webdriver_url: env_or("WEBDRIVER_URL", "http://localhost:9515"),
            chart_url: env_or(
                "CHART_URL",
                "https://upbit.com/full_chart?code=CRIX.UPBIT.KRW-BTC",
            ),
            cycle_interval_secs: env_parse("CYCLE_INTERVAL_SECS", 4 * 3600),
            retry_delay_secs: env_parse("RETRY_DELAY_SECS", 300),
            min_order_krw: env_parse("MIN_ORDER_KRW", 5000.0),
            fee_buffer: env_parse("FEE_BUFFER", 0.9995),
            dashboard_port: env_parse("DASHBOARD_PORT", 8000),
        }
    }

    /// Exchange credentials, required for trading (not for the dashboard)
    pub fn upbit_keys(&self) -> Result<(&str, &str)> {
        match (&self.upbit_access_key, &self.upbit_secret_key) {
            (Some(access), Some(secret)) => Ok((access, secret)),
            _ => Err("UPBIT_ACCESS_KEY / UPBIT_SECRET_KEY not set".into()),
        }
    }

    pub fn openai_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| "OPENAI_API_KEY not set".into())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
