//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Each window is summed afresh so rounding
//! never carries from one date to the next.
//! Warmup: first (n-1) values are undefined.

/// Mean of `window`. A window of identical values returns that value exactly.
pub fn window_mean(window: &[f64]) -> f64 {
    let first = window[0];
    if window.iter().all(|&v| v == first) {
        return first;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    (0..closes.len())
        .map(|i| {
            if i + 1 >= period {
                Some(window_mean(&closes[i + 1 - period..=i]))
            } else {
                None
            }
        })
        .collect()
}
