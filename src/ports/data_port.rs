//! Market data port trait.

use crate::domain::error::TrendcastError;
use crate::domain::ohlcv::RawBar;
use chrono::{Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Bar interval requested from the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Daily,
}

impl FromStr for Interval {
    type Err = TrendcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" | "daily" => Ok(Interval::Daily),
            other => Err(TrendcastError::invalid(
                "data",
                "interval",
                format!("unsupported interval '{}' (expected 1d)", other),
            )),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Daily => write!(f, "1d"),
        }
    }
}

/// Backend that stores the bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A directory of `<SYMBOL>.csv` files.
    Csv,
    /// A SQLite database file with a `bars` table.
    Sqlite,
}

impl FromStr for SourceKind {
    type Err = TrendcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(SourceKind::Csv),
            "sqlite" => Ok(SourceKind::Sqlite),
            other => Err(TrendcastError::invalid(
                "data",
                "source",
                format!("unknown source '{}' (expected csv or sqlite)", other),
            )),
        }
    }
}

/// Exclusive lower bound of a lookback window ending at `last`.
/// `None` when the window reaches past the earliest representable date,
/// in which case every stored bar is inside it.
pub fn lookback_cutoff(last: NaiveDate, lookback_days: u32) -> Option<NaiveDate> {
    last.checked_sub_signed(Duration::days(i64::from(lookback_days)))
}

pub trait DataPort {
    /// Bars for `symbol` covering the trailing `lookback_days` calendar days.
    /// May return an empty vector when the source has nothing.
    fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<Vec<RawBar>, TrendcastError>;

    /// Symbols the source can serve, sorted.
    fn list_symbols(&self) -> Result<Vec<String>, TrendcastError>;
}
