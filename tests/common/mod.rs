#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;
use trendcast::domain::bar_series::BarSeries;
use trendcast::domain::error::TrendcastError;
pub use trendcast::domain::ohlcv::{OhlcvBar, RawBar};
use trendcast::ports::data_port::{DataPort, Interval};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<RawBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<RawBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        _lookback_days: u32,
        _interval: Interval,
    ) -> Result<Vec<RawBar>, TrendcastError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TrendcastError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendcastError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` consecutive weekdays starting at `start` (or the next weekday).
pub fn weekdays(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut d = start;
    while dates.len() < count {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(d);
        }
        d = d.succ_opt().unwrap();
    }
    dates
}

pub fn make_bar(date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1000,
    }
}

pub fn raw_bar(date: NaiveDate, close: Option<f64>) -> RawBar {
    let reference = close.unwrap_or(100.0);
    RawBar {
        date,
        open: reference,
        high: reference * 1.01,
        low: reference * 0.99,
        close,
        volume: 1000,
    }
}

/// A weekday series with the given closes, starting 2024-01-01.
pub fn series_from_closes(symbol: &str, closes: &[f64]) -> BarSeries {
    let bars = weekdays(date(2024, 1, 1), closes.len())
        .into_iter()
        .zip(closes)
        .map(|(d, &c)| make_bar(d, c))
        .collect();
    BarSeries::new(symbol, bars).unwrap()
}

/// Raw rows for the mock port, with every close present.
pub fn raw_from_closes(closes: &[f64]) -> Vec<RawBar> {
    weekdays(date(2024, 1, 1), closes.len())
        .into_iter()
        .zip(closes)
        .map(|(d, &c)| raw_bar(d, Some(c)))
        .collect()
}

/// Closes rising by one per day from `start`.
pub fn rising_closes(count: usize, start: f64) -> Vec<f64> {
    (0..count).map(|i| start + i as f64).collect()
}

pub fn csv_content(closes: &[f64]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for (d, c) in weekdays(date(2024, 1, 1), closes.len()).into_iter().zip(closes) {
        out.push_str(&format!(
            "{},{},{},{},{},1000\n",
            d.format("%Y-%m-%d"),
            c,
            c * 1.01,
            c * 0.99,
            c
        ));
    }
    out
}
