use super::moving_average::ema_series;

/// MACD line, signal line and histogram over a close series
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD = EMA(fast) - EMA(slow); signal = EMA(signal_span) of the MACD line;
/// histogram = MACD - signal. EMAs are seeded from the first row, so every
/// row is defined (values before ~`slow` rows of history are unreliable,
/// which is why callers feed 26+ candles).
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> MacdSeries {
    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema_series(&macd, signal_span);
    let histogram: Vec<f64> = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_series_is_zero() {
        let closes = vec![100.0; 40];
        let macd = macd_series(&closes, 12, 26, 9);
        assert!(macd.macd.iter().all(|v| v.abs() < 1e-12));
        assert!(macd.signal.iter().all(|v| v.abs() < 1e-12));
        assert!(macd.histogram.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_uptrend_turns_macd_positive() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 2.0).collect();
        let macd = macd_series(&closes, 12, 26, 9);
        // fast EMA tracks a rising series more closely than slow EMA
        assert!(*macd.macd.last().unwrap() > 0.0);
    }

    #[test]
    fn test_same_length_as_input() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 7) as f64).collect();
        let macd = macd_series(&closes, 12, 26, 9);
        assert_eq!(macd.macd.len(), closes.len());
        assert_eq!(macd.signal.len(), closes.len());
        assert_eq!(macd.histogram.len(), closes.len());
    }
}
