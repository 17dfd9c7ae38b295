//! Technical indicator implementations.
//!
//! Each indicator is a pure function over a closing-price slice that
//! returns one `Option` per input date; `None` marks dates where the
//! trailing window is not yet full. [`IndicatorSet`] bundles the
//! indicators the signal evaluator consumes into one date-keyed view.

pub mod bollinger;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use bollinger::BollingerBands;

use crate::domain::bar_series::BarSeries;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Bollinger { period: usize, k_x100: u32 },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Bollinger { period, k_x100 } => {
                let k = *k_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, k)
            }
        }
    }
}

/// Window parameters for the indicator set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorConfig {
    pub sma_period: usize,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_period: 20,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_k: 2.0,
        }
    }
}

impl IndicatorConfig {
    pub fn indicator_types(&self) -> [IndicatorType; 3] {
        [
            IndicatorType::Sma(self.sma_period),
            IndicatorType::Rsi(self.rsi_period),
            IndicatorType::Bollinger {
                period: self.bollinger_period,
                k_x100: (self.bollinger_k * 100.0).round() as u32,
            },
        ]
    }
}

/// Indicator values for a single date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub sma: Option<f64>,
    pub rsi: Option<f64>,
    pub bollinger: Option<BollingerBands>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub config: IndicatorConfig,
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorSet {
    /// Compute every indicator over the full date range of `series`.
    /// An empty series yields an empty set.
    pub fn compute(series: &BarSeries, config: IndicatorConfig) -> Self {
        let closes = series.closes();
        let sma = sma::calculate_sma(&closes, config.sma_period);
        let rsi = rsi::calculate_rsi(&closes, config.rsi_period);
        let bands =
            bollinger::calculate_bollinger(&closes, config.bollinger_period, config.bollinger_k);

        let rows = series
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| IndicatorRow {
                date: bar.date,
                sma: sma[i],
                rsi: rsi[i],
                bollinger: bands[i],
            })
            .collect();

        Self { config, rows }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&IndicatorRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
