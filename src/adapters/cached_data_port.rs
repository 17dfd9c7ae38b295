//! TTL cache in front of another data port.
//!
//! Repeated fetches for the same symbol, lookback and interval inside the
//! TTL are served from memory. Failed fetches are never cached.

use crate::domain::error::TrendcastError;
use crate::domain::ohlcv::RawBar;
use crate::ports::data_port::{DataPort, Interval};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry {
    bars: Vec<RawBar>,
    expires_at: Instant,
}

pub struct CachedDataPort<P> {
    inner: P,
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl<P: DataPort> CachedDataPort<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
        }
    }

    fn key(symbol: &str, lookback_days: u32, interval: Interval) -> String {
        format!("{}:{}:{}", symbol, lookback_days, interval)
    }

    fn cached(&self, key: &str) -> Option<Vec<RawBar>> {
        let entry = self.entries.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.bars.clone())
        } else {
            drop(entry);
            self.entries.remove(key);
            None
        }
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of entries held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: DataPort> DataPort for CachedDataPort<P> {
    fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<Vec<RawBar>, TrendcastError> {
        let key = Self::key(symbol, lookback_days, interval);
        if let Some(bars) = self.cached(&key) {
            debug!(symbol, "bar cache hit");
            return Ok(bars);
        }

        let bars = self.inner.fetch_bars(symbol, lookback_days, interval)?;
        self.entries.insert(
            key,
            CacheEntry {
                bars: bars.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendcastError> {
        self.inner.list_symbols()
    }
}
