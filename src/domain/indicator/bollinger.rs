//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (k × StdDev)
//! - Lower: Middle - (k × StdDev)
//!
//! StdDev is the trailing sample standard deviation (divides by n-1) over
//! the same window as the middle band, so band and SMA values line up by date.
//!
//! Default parameters: period=20, k=2.0
//! Warmup: first (period-1) values are undefined.

use super::sma::calculate_sma;
use super::stddev::calculate_stddev;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn calculate_bollinger(closes: &[f64], period: usize, k: f64) -> Vec<Option<BollingerBands>> {
    let middle = calculate_sma(closes, period);
    let sigma = calculate_stddev(closes, period);

    middle
        .into_iter()
        .zip(sigma)
        .map(|(mid, sd)| match (mid, sd) {
            (Some(middle), Some(sd)) => Some(BollingerBands {
                upper: middle + k * sd,
                middle,
                lower: middle - k * sd,
            }),
            _ => None,
        })
        .collect()
}
