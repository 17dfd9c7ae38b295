//! OHLCV bar representation.

use chrono::NaiveDate;

/// A validated daily bar. Prices are positive and finite.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// A bar as delivered by a market data source. The close may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: Option<f64>,
    pub volume: i64,
}

impl OhlcvBar {
    /// Returns a description of the first invalid field, if any.
    pub(crate) fn invalid_field(&self) -> Option<&'static str> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Some(name);
            }
        }
        if self.volume < 0 {
            return Some("volume");
        }
        None
    }
}
