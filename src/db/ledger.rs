use crate::models::{PortfolioPerformance, TradeRecord, TradeStatistics};
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

/// Fields for a new ledger row. The id is assigned by the database and the
/// reflection starts out NULL.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub timestamp: String,
    pub decision: String,
    pub reason: String,
    pub percentage: i64,
    pub btc_balance: f64,
    pub krw_balance: f64,
    pub btc_avg_buy_price: f64,
    pub btc_krw_price: f64,
}

/// Reflection listing row for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct ReflectionSummary {
    pub id: i64,
    pub timestamp: String,
    pub decision: String,
    pub reflection: String,
}

/// Append-only trade ledger backed by SQLite.
///
/// Rows are never deleted or reordered; the only post-insert write is
/// `update_reflection`, which refuses to overwrite an existing reflection.
pub struct TradeLedger {
    pool: SqlitePool,
}

impl TradeLedger {
    /// Open (or create) the ledger and make sure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self> {
        // a single connection keeps in-memory databases coherent and
        // serializes writers; SQLite would serialize them anyway
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .with_context(|| format!("failed to open trade ledger at {}", database_url))?;

        let ledger = Self { pool };
        ledger.init().await?;
        tracing::info!("Trade ledger ready at {}", database_url);
        Ok(ledger)
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT,
                decision TEXT,
                reason TEXT,
                percentage INTEGER,
                btc_balance REAL,
                krw_balance REAL,
                btc_avg_buy_price REAL,
                btc_krw_price REAL,
                reflection TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Append one cycle's record, returning the assigned row id
    pub async fn insert(&self, trade: &NewTrade) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO trades (timestamp, decision, reason, percentage,
                                btc_balance, krw_balance, btc_avg_buy_price,
                                btc_krw_price, reflection)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)
            "#,
        )
        .bind(&trade.timestamp)
        .bind(&trade.decision)
        .bind(&trade.reason)
        .bind(trade.percentage)
        .bind(trade.btc_balance)
        .bind(trade.krw_balance)
        .bind(trade.btc_avg_buy_price)
        .bind(trade.btc_krw_price)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!("Inserted trade {} ({})", id, trade.decision);
        Ok(id)
    }

    /// All trades, newest first
    pub async fn all_trades(&self, limit: Option<i64>) -> Result<Vec<TradeRecord>> {
        let rows = match limit {
            Some(limit) => {
                sqlx::query("SELECT * FROM trades ORDER BY timestamp DESC LIMIT ?1")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM trades ORDER BY timestamp DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(row_to_record).collect()
    }

    pub async fn trade_by_id(&self, id: i64) -> Result<Option<TradeRecord>> {
        let row = sqlx::query("SELECT * FROM trades WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    pub async fn latest_trade(&self) -> Result<Option<TradeRecord>> {
        let row = sqlx::query("SELECT * FROM trades ORDER BY timestamp DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    /// Aggregate counts and first/last trade dates
    pub async fn statistics(&self) -> Result<TradeStatistics> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trades")
            .fetch_one(&self.pool)
            .await?;

        let count_rows =
            sqlx::query("SELECT decision, COUNT(*) as count FROM trades GROUP BY decision")
                .fetch_all(&self.pool)
                .await?;
        let mut decision_counts = HashMap::new();
        for row in count_rows {
            decision_counts.insert(row.try_get::<String, _>("decision")?, row.try_get("count")?);
        }

        let dates = sqlx::query("SELECT MIN(timestamp) as first, MAX(timestamp) as last FROM trades")
            .fetch_one(&self.pool)
            .await?;

        Ok(TradeStatistics {
            total_trades: total,
            decision_counts,
            first_trade_date: dates.try_get("first")?,
            last_trade_date: dates.try_get("last")?,
            latest_trade: self.latest_trade().await?,
        })
    }

    /// Profit/loss of the latest record against the first record
    pub async fn portfolio_performance(&self) -> Result<PortfolioPerformance> {
        let latest = match self.latest_trade().await? {
            Some(latest) => latest,
            None => return Ok(empty_performance()),
        };
        let first_row = sqlx::query("SELECT * FROM trades ORDER BY timestamp ASC LIMIT 1")
            .fetch_one(&self.pool)
            .await?;
        let first = row_to_record(&first_row)?;

        let total_value = latest.total_value_krw();
        let initial_value = first.total_value_krw();
        let (profit_loss, profit_loss_percentage) = if initial_value > 0.0 {
            let pl = total_value - initial_value;
            (pl, pl / initial_value * 100.0)
        } else {
            (0.0, 0.0)
        };

        Ok(PortfolioPerformance {
            current_btc_balance: latest.btc_balance,
            current_krw_balance: latest.krw_balance,
            btc_avg_buy_price: latest.btc_avg_buy_price,
            current_btc_price: latest.btc_krw_price,
            total_value_krw: total_value,
            initial_value_krw: initial_value,
            profit_loss,
            profit_loss_percentage,
        })
    }

    /// Most recent rows that already carry a reflection
    pub async fn recent_reflections(&self, limit: i64) -> Result<Vec<ReflectionSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, timestamp, decision, reflection
            FROM trades
            WHERE reflection IS NOT NULL AND reflection != ''
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut reflections = Vec::with_capacity(rows.len());
        for row in rows {
            reflections.push(ReflectionSummary {
                id: row.try_get("id")?,
                timestamp: row.try_get("timestamp")?,
                decision: row.try_get("decision")?,
                reflection: row.try_get("reflection")?,
            });
        }
        Ok(reflections)
    }

    /// Reflection texts alone, newest first, for the decision prompt
    pub async fn past_reflection_texts(&self, limit: i64) -> Result<Vec<String>> {
        Ok(self
            .recent_reflections(limit)
            .await?
            .into_iter()
            .map(|r| r.reflection)
            .collect())
    }

    /// Most recent rows still lacking a reflection
    pub async fn reflection_candidates(&self, limit: i64) -> Result<Vec<TradeRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM trades
            WHERE reflection IS NULL OR reflection = ''
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_record).collect()
    }

    /// Attach a reflection to a row. A no-op if the row already has one:
    /// reflections are written at most once and never overwritten.
    /// Returns whether the row was updated.
    pub async fn update_reflection(&self, id: i64, text: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trades
            SET reflection = ?1
            WHERE id = ?2 AND (reflection IS NULL OR reflection = '')
            "#,
        )
        .bind(text)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_record(row: &SqliteRow) -> Result<TradeRecord> {
    Ok(TradeRecord {
        id: row.try_get("id")?,
        timestamp: row.try_get("timestamp")?,
        decision: row.try_get("decision")?,
        reason: row.try_get("reason")?,
        percentage: row.try_get("percentage")?,
        btc_balance: row.try_get("btc_balance")?,
        krw_balance: row.try_get("krw_balance")?,
        btc_avg_buy_price: row.try_get("btc_avg_buy_price")?,
        btc_krw_price: row.try_get("btc_krw_price")?,
        reflection: row.try_get("reflection")?,
    })
}

fn empty_performance() -> PortfolioPerformance {
    PortfolioPerformance {
        current_btc_balance: 0.0,
        current_krw_balance: 0.0,
        btc_avg_buy_price: 0.0,
        current_btc_price: 0.0,
        total_value_krw: 0.0,
        initial_value_krw: 0.0,
        profit_loss: 0.0,
        profit_loss_percentage: 0.0,
    }
}
