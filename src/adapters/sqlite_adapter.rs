//! SQLite bar store adapter.
//!
//! Reads daily bars from a `bars` table keyed by `(symbol, date)`. A NULL
//! close is a missing close and is forward-filled when the series is built.

use crate::domain::error::TrendcastError;
use crate::domain::ohlcv::RawBar;
use crate::ports::data_port::{lookback_cutoff, DataPort, Interval};
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;
use tracing::debug;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> TrendcastError {
    TrendcastError::DataSource {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> TrendcastError {
    TrendcastError::DataSource {
        reason: format!("sqlite query failed: {}", e),
    }
}

impl SqliteAdapter {
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self, TrendcastError> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(pool_error)?;
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TrendcastError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TrendcastError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), TrendcastError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS bars (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL,
                    volume INTEGER NOT NULL,
                    PRIMARY KEY (symbol, date)
                );",
            )
            .map_err(query_error)
    }

    pub fn insert_bars(&self, symbol: &str, bars: &[RawBar]) -> Result<(), TrendcastError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO bars (symbol, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    symbol,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_error)?;
        }
        tx.commit().map_err(query_error)
    }

    fn last_date(&self, symbol: &str) -> Result<Option<NaiveDate>, TrendcastError> {
        let last: Option<String> = self
            .conn()?
            .query_row(
                "SELECT MAX(date) FROM bars WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )
            .map_err(query_error)?;
        last.map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| TrendcastError::DataSource {
                reason: format!("invalid stored date '{}': {}", s, e),
            })
        })
        .transpose()
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<Vec<RawBar>, TrendcastError> {
        let Some(last) = self.last_date(symbol)? else {
            return Ok(Vec::new());
        };
        // An empty string sorts before every stored date.
        let cutoff = lookback_cutoff(last, lookback_days)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM bars
                 WHERE symbol = ?1 AND date > ?2
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![symbol, cutoff],
                |row| {
                    let date_str: String = row.get(0)?;
                    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    Ok(RawBar {
                        date,
                        open: row.get(1)?,
                        high: row.get(2)?,
                        low: row.get(3)?,
                        close: row.get(4)?,
                        volume: row.get(5)?,
                    })
                },
            )
            .map_err(query_error)?;

        let bars = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;
        debug!(symbol, %interval, rows = bars.len(), "read sqlite bars");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendcastError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM bars ORDER BY symbol")
            .map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(query_error)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_error)
    }
}
