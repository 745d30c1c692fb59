// Technical indicators over candle series.
// Series-valued: every function returns one entry per input row, with the
// warm-up prefix of windowed indicators left undefined rather than zeroed.

pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use bollinger::{bollinger_series, BollingerSeries};
pub use macd::{macd_series, MacdSeries};
pub use moving_average::{ema_series, sma_series};
pub use rsi::rsi_series;

use crate::models::Candle;
use serde::Serialize;

pub const BB_WINDOW: usize = 20;
pub const BB_STD_DEV: f64 = 2.0;
pub const RSI_WINDOW: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const SMA_WINDOW: usize = 20;
pub const EMA_SPAN: usize = 12;

/// Derived indicator values for one candle. `None` = not enough history yet.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndicatorRow {
    pub bb_mavg: Option<f64>,
    pub bb_hband: Option<f64>,
    pub bb_lband: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_diff: Option<f64>,
    pub sma_20: Option<f64>,
    pub ema_12: Option<f64>,
}

/// A candle series plus its derived indicators, same length, same order
#[derive(Debug, Clone)]
pub struct AnnotatedSeries {
    pub candles: Vec<Candle>,
    pub indicators: Vec<IndicatorRow>,
}

impl AnnotatedSeries {
    pub fn latest(&self) -> Option<(&Candle, &IndicatorRow)> {
        Some((self.candles.last()?, self.indicators.last()?))
    }

    /// Candle fields and indicator fields merged per row, for serialization
    /// into the decision prompt and dashboard responses
    pub fn to_json_rows(&self) -> Vec<serde_json::Value> {
        self.candles
            .iter()
            .zip(&self.indicators)
            .map(|(candle, row)| {
                let mut merged = serde_json::to_value(candle).unwrap_or_default();
                if let (Some(obj), Ok(serde_json::Value::Object(extra))) =
                    (merged.as_object_mut(), serde_json::to_value(row))
                {
                    obj.extend(extra);
                }
                merged
            })
            .collect()
    }
}

/// Compute the full indicator set for a candle series.
///
/// Purely functional: same candles in, same rows out. Recommended minimum of
/// 26 candles for the MACD slow EMA to settle.
pub fn annotate(candles: &[Candle]) -> AnnotatedSeries {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let bands = bollinger_series(&closes, BB_WINDOW, BB_STD_DEV);
    let rsi = rsi_series(&closes, RSI_WINDOW);
    let macd = macd_series(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let sma = sma_series(&closes, SMA_WINDOW);
    let ema = ema_series(&closes, EMA_SPAN);

    let indicators = (0..candles.len())
        .map(|i| IndicatorRow {
            bb_mavg: bands.mavg[i],
            bb_hband: bands.hband[i],
            bb_lband: bands.lband[i],
            rsi: rsi[i],
            macd: Some(macd.macd[i]),
            macd_signal: Some(macd.signal[i]),
            macd_diff: Some(macd.histogram[i]),
            sma_20: sma[i],
            ema_12: Some(ema[i]),
        })
        .collect();

    AnnotatedSeries {
        candles: candles.to_vec(),
        indicators,
    }
}
