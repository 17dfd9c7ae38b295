//! Bar series: the normalized, validated price history for one instrument.
//!
//! A `BarSeries` is sorted ascending by date with no duplicate dates.
//! Gaps between trading days are allowed and left as-is. The series is
//! never mutated after construction; derived data is always returned as
//! new values.

use crate::domain::error::TrendcastError;
use crate::domain::ohlcv::{OhlcvBar, RawBar};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    /// Build a series from validated bars, rejecting unsorted input,
    /// duplicate dates and non-positive or non-finite prices.
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, TrendcastError> {
        for (i, bar) in bars.iter().enumerate() {
            if let Some(field) = bar.invalid_field() {
                return Err(TrendcastError::degenerate(format!(
                    "bar {} ({}) has invalid {}",
                    i, bar.date, field
                )));
            }
            if i > 0 {
                let prev = bars[i - 1].date;
                if bar.date == prev {
                    return Err(TrendcastError::degenerate(format!(
                        "duplicate date {}",
                        bar.date
                    )));
                }
                if bar.date < prev {
                    return Err(TrendcastError::degenerate(format!(
                        "dates out of order at {} (after {})",
                        bar.date, prev
                    )));
                }
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Build a series from raw source rows.
    ///
    /// Rows are sorted by date first. A missing close is carried forward
    /// from the most recent prior close; rows before the first available
    /// close are dropped since there is nothing to carry.
    pub fn from_raw(symbol: impl Into<String>, mut rows: Vec<RawBar>) -> Result<Self, TrendcastError> {
        rows.sort_by_key(|r| r.date);

        let mut bars = Vec::with_capacity(rows.len());
        let mut last_close: Option<f64> = None;

        for row in rows {
            let close = match row.close.or(last_close) {
                Some(c) => c,
                None => continue,
            };
            last_close = Some(close);
            bars.push(OhlcvBar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close,
                volume: row.volume,
            });
        }

        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// First bar strictly after `date`.
    pub fn first_after(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        let idx = self.bars.partition_point(|b| b.date <= date);
        self.bars.get(idx)
    }

    /// A new series holding the first `n` bars.
    pub fn truncate_to(&self, n: usize) -> BarSeries {
        BarSeries {
            symbol: self.symbol.clone(),
            bars: self.bars[..n.min(self.bars.len())].to_vec(),
        }
    }
}
