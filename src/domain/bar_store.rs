//! Bar store: holds the current analysis cycle's series for one instrument.

use crate::domain::bar_series::BarSeries;
use crate::domain::error::TrendcastError;
use crate::ports::data_port::{DataPort, Interval};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct BarStore {
    series: Option<BarSeries>,
}

impl BarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch bars from the data source and normalize them.
    ///
    /// An empty result or a failed fetch both surface as `NoDataAvailable`.
    pub fn load(
        &mut self,
        port: &dyn DataPort,
        symbol: &str,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<&BarSeries, TrendcastError> {
        let rows = port
            .fetch_bars(symbol, lookback_days, interval)
            .map_err(|e| {
                warn!(symbol, error = %e, "bar fetch failed");
                TrendcastError::NoDataAvailable {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let series = BarSeries::from_raw(symbol, rows)?;
        if series.is_empty() {
            return Err(TrendcastError::NoDataAvailable {
                symbol: symbol.to_string(),
                reason: "empty series".into(),
            });
        }

        debug!(symbol, bars = series.len(), "loaded bar series");
        Ok(&*self.series.insert(series))
    }

    pub fn series(&self) -> Option<&BarSeries> {
        self.series.as_ref()
    }

    /// Drop the loaded series so the next cycle refetches.
    pub fn reset(&mut self) {
        self.series = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::RawBar;
    use chrono::NaiveDate;

    struct FixedPort {
        rows: Result<Vec<RawBar>, String>,
    }

    impl DataPort for FixedPort {
        fn fetch_bars(
            &self,
            _symbol: &str,
            _lookback_days: u32,
            _interval: Interval,
        ) -> Result<Vec<RawBar>, TrendcastError> {
            self.rows.clone().map_err(|reason| TrendcastError::DataSource { reason })
        }

        fn list_symbols(&self) -> Result<Vec<String>, TrendcastError> {
            Ok(vec!["ABC".into()])
        }
    }

    fn raw(day: u32, close: f64) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close: Some(close),
            volume: 10,
        }
    }

    #[test]
    fn load_stores_series() {
        let port = FixedPort {
            rows: Ok(vec![raw(1, 10.0), raw(4, 11.0)]),
        };
        let mut store = BarStore::new();
        let series = store.load(&port, "ABC", 30, Interval::Daily).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(store.series().unwrap().symbol(), "ABC");
    }

    #[test]
    fn empty_fetch_is_no_data() {
        let port = FixedPort { rows: Ok(vec![]) };
        let mut store = BarStore::new();
        let err = store.load(&port, "ABC", 30, Interval::Daily).unwrap_err();
        assert!(matches!(err, TrendcastError::NoDataAvailable { .. }));
        assert!(store.series().is_none());
    }

    #[test]
    fn failed_fetch_is_no_data() {
        let port = FixedPort {
            rows: Err("connection refused".into()),
        };
        let mut store = BarStore::new();
        let err = store.load(&port, "ABC", 30, Interval::Daily).unwrap_err();
        match err {
            TrendcastError::NoDataAvailable { symbol, reason } => {
                assert_eq!(symbol, "ABC");
                assert!(reason.contains("connection refused"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reset_clears_series() {
        let port = FixedPort {
            rows: Ok(vec![raw(1, 10.0)]),
        };
        let mut store = BarStore::new();
        store.load(&port, "ABC", 30, Interval::Daily).unwrap();
        store.reset();
        assert!(store.series().is_none());
    }
}
