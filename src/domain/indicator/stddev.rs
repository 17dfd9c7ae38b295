//! Trailing standard deviation of closing prices.
//!
//! Sample standard deviation (divides by n-1) over the trailing `period`
//! closes. Warmup: first (period-1) values are undefined.

use super::sma::window_mean;

/// Sample standard deviation of `values`. Zero for fewer than two values
/// and exactly zero when every value is the same.
pub fn sample_stddev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 || values.iter().all(|&v| v == values[0]) {
        return 0.0;
    }
    let mean = window_mean(values);
    let ss: f64 = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum();
    (ss / (n - 1) as f64).sqrt()
}

pub fn calculate_stddev(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; closes.len()];
    }
    (0..closes.len())
        .map(|i| {
            if i + 1 >= period {
                Some(sample_stddev(&closes[i + 1 - period..=i]))
            } else {
                None
            }
        })
        .collect()
}
