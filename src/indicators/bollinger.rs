use super::moving_average::sma_series;

/// Bollinger bands over a close series
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub mavg: Vec<Option<f64>>,
    pub hband: Vec<Option<f64>>,
    pub lband: Vec<Option<f64>>,
}

/// Rolling mean ± `k` rolling standard deviations (sample std, matching
/// pandas `rolling(window).std()`). The first window-1 rows are undefined.
pub fn bollinger_series(closes: &[f64], window: usize, k: f64) -> BollingerSeries {
    let mavg = sma_series(closes, window);
    let std = rolling_std(closes, window);

    let mut hband = Vec::with_capacity(closes.len());
    let mut lband = Vec::with_capacity(closes.len());
    for (mean, sd) in mavg.iter().zip(&std) {
        match (mean, sd) {
            (Some(mean), Some(sd)) => {
                hband.push(Some(mean + k * sd));
                lband.push(Some(mean - k * sd));
            }
            _ => {
                hband.push(None);
                lband.push(None);
            }
        }
    }

    BollingerSeries { mavg, hband, lband }
}

fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window || window < 2 {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                let mean = slice.iter().sum::<f64>() / window as f64;
                let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (window as f64 - 1.0);
                Some(variance.sqrt())
            }
        })
        .collect()
}
