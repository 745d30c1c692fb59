/// Rolling Simple Moving Average.
///
/// Output is the same length as the input; entries before the window has
/// filled are `None`.
pub fn sma_series(values: &[f64], window: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                None
            } else {
                let sum: f64 = values[i + 1 - window..=i].iter().sum();
                Some(sum / window as f64)
            }
        })
        .collect()
}

/// Exponential Moving Average with smoothing 2/(span+1), seeded from the
/// first value (pandas `ewm(span, adjust=False)`). Defined for every row.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = match values.first() {
        Some(&first) => first,
        None => return out,
    };
    out.push(ema);
    for &value in &values[1..] {
        ema = alpha * value + (1.0 - alpha) * ema;
        out.push(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_series() {
        let values = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        let sma = sma_series(&values, 5);
        assert_eq!(sma, vec![None, None, None, None, Some(104.0)]);
    }

    #[test]
    fn test_sma_window_prefix_is_undefined() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let sma = sma_series(&values, 3);
        assert_eq!(sma[0], None);
        assert_eq!(sma[1], None);
        assert_eq!(sma[2], Some(2.0));
        assert_eq!(sma[3], Some(3.0));
    }

    #[test]
    fn test_ema_series_recursion() {
        // span 3 -> alpha 0.5, seeded at the first value
        let values = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        let ema = ema_series(&values, 3);
        assert_eq!(ema, vec![100.0, 101.0, 102.5, 104.25, 106.125]);
    }

    #[test]
    fn test_ema_empty_input() {
        assert!(ema_series(&[], 12).is_empty());
    }
}
