/// Relative Strength Index over a close series.
///
/// Uses rolling simple averages of gains and losses (not Wilder smoothing):
/// RSI = 100 - 100 / (1 + avg_gain / avg_loss). A window with no losses is
/// fully overbought and reported as 100.
///
/// The first `window` rows are undefined: one row is consumed by the price
/// delta, window-1 more by the rolling average.
pub fn rsi_series(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if closes.len() <= window {
        return out;
    }

    // deltas[i] is the change from closes[i] to closes[i+1]
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    for i in window..closes.len() {
        let recent = &deltas[i - window..i];
        let avg_gain: f64 =
            recent.iter().filter(|d| **d > 0.0).sum::<f64>() / window as f64;
        let avg_loss: f64 =
            recent.iter().filter(|d| **d < 0.0).map(|d| -d).sum::<f64>() / window as f64;

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };
        out[i] = Some(rsi);
    }

    out
}
