//! CSV file data adapter.
//!
//! Each symbol lives in `<base>/<SYMBOL>.csv` with the columns
//! `date,open,high,low,close,volume`. An empty close cell is a missing
//! close and is forward-filled when the series is built.

use crate::domain::error::TrendcastError;
use crate::domain::ohlcv::RawBar;
use crate::ports::data_port::{lookback_cutoff, DataPort, Interval};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_price(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, TrendcastError> {
    record
        .get(idx)
        .ok_or_else(|| TrendcastError::DataSource {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| TrendcastError::DataSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn parse_record(record: &csv::StringRecord) -> Result<RawBar, TrendcastError> {
    let date_str = record.get(0).ok_or_else(|| TrendcastError::DataSource {
        reason: "missing date column".into(),
    })?;
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
        TrendcastError::DataSource {
            reason: format!("invalid date format: {}", e),
        }
    })?;

    let close = match record.get(4).map(str::trim) {
        None | Some("") => None,
        Some(_) => Some(parse_price(record, 4, "close")?),
    };

    let volume: i64 = record
        .get(5)
        .ok_or_else(|| TrendcastError::DataSource {
            reason: "missing volume column".into(),
        })?
        .trim()
        .parse()
        .map_err(|e| TrendcastError::DataSource {
            reason: format!("invalid volume value: {}", e),
        })?;

    Ok(RawBar {
        date,
        open: parse_price(record, 1, "open")?,
        high: parse_price(record, 2, "high")?,
        low: parse_price(record, 3, "low")?,
        close,
        volume,
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<Vec<RawBar>, TrendcastError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TrendcastError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TrendcastError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;
            bars.push(parse_record(&record)?);
        }
        bars.sort_by_key(|b| b.date);
        debug!(symbol, %interval, rows = bars.len(), "read csv bars");

        // The window ends at the newest row, not at today.
        if let Some(cutoff) = bars
            .last()
            .and_then(|b| lookback_cutoff(b.date, lookback_days))
        {
            bars.retain(|b| b.date > cutoff);
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendcastError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendcastError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TrendcastError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,,60000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fetch_bars_returns_sorted_rows() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("BHP", 365, Interval::Daily).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, d(2024, 1, 15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, Some(105.0));
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, d(2024, 1, 17));
    }

    #[test]
    fn empty_close_cell_is_missing() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("BHP", 365, Interval::Daily).unwrap();
        assert_eq!(bars[1].date, d(2024, 1, 16));
        assert_eq!(bars[1].close, None);
    }

    #[test]
    fn lookback_window_ends_at_last_row() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("BHP", 1, Interval::Daily).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, d(2024, 1, 17));

        let bars = adapter.fetch_bars("BHP", 2, Interval::Daily).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn lookback_past_calendar_range_returns_every_row() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_bars("BHP", 4_000_000_000, Interval::Daily)
            .unwrap();
        assert_eq!(bars.len(), 3);
    }

    #[test]
    fn header_only_file_is_empty() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_bars("CBA", 30, Interval::Daily).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_data_source_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_bars("XYZ", 30, Interval::Daily).unwrap_err();
        assert!(matches!(err, TrendcastError::DataSource { .. }));
    }

    #[test]
    fn malformed_price_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,abc,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_bars("BAD", 30, Interval::Daily).unwrap_err();
        assert!(err.to_string().contains("open"));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "CBA"]);
    }
}
