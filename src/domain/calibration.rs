//! Calibration monitor: compares past forecasts with realized closes.
//!
//! Each tracked forecast's first projected value is held, keyed by symbol
//! and `as_of` date, until the first bar after that date appears in a
//! series for the same symbol, then scored. The monitor only
//! reports whether recalibration is advisable; choosing a more aggressive
//! fit on the next call is left to the caller.

use crate::domain::bar_series::BarSeries;
use crate::domain::error::TrendcastError;
use crate::domain::forecast::{Aggressiveness, ForecastResult};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

pub const DEFAULT_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationRecord {
    /// Trading date of the realized close.
    pub date: NaiveDate,
    pub predicted_prior_close: f64,
    pub actual_close: f64,
    pub error_pct: f64,
    pub recalibration_triggered: bool,
}

type PendingKey = (String, NaiveDate);

#[derive(Debug, Default)]
struct MonitorState {
    log: Vec<CalibrationRecord>,
    pending: BTreeMap<PendingKey, f64>,
}

#[derive(Debug)]
pub struct CalibrationMonitor {
    threshold_pct: f64,
    state: Mutex<MonitorState>,
}

impl Default for CalibrationMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PCT)
    }
}

impl CalibrationMonitor {
    pub fn new(threshold_pct: f64) -> Self {
        Self {
            threshold_pct,
            state: Mutex::new(MonitorState::default()),
        }
    }

    pub fn threshold_pct(&self) -> f64 {
        self.threshold_pct
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        // Records are appended whole, so a poisoned lock still holds a consistent log.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Score one prediction against the realized close and append the record.
    pub fn record_and_check(
        &self,
        date: NaiveDate,
        predicted: f64,
        actual: f64,
    ) -> Result<CalibrationRecord, TrendcastError> {
        if !actual.is_finite() || actual <= 0.0 {
            return Err(TrendcastError::degenerate(format!(
                "actual close {} is not a positive finite price",
                actual
            )));
        }
        if !predicted.is_finite() {
            return Err(TrendcastError::degenerate(format!(
                "predicted close {} is not finite",
                predicted
            )));
        }

        let error_pct = (actual - predicted).abs() / actual * 100.0;
        let record = CalibrationRecord {
            date,
            predicted_prior_close: predicted,
            actual_close: actual,
            error_pct,
            recalibration_triggered: error_pct > self.threshold_pct,
        };

        if record.recalibration_triggered {
            warn!(
                %date,
                error_pct,
                threshold = self.threshold_pct,
                "forecast error above threshold, recalibration advised"
            );
        } else {
            info!(%date, error_pct, "forecast error within threshold");
        }

        self.state().log.push(record);
        Ok(record)
    }

    /// Remember a forecast's first projected value for later scoring.
    /// A newer forecast for the same symbol and `as_of` replaces the older one.
    pub fn track(&self, forecast: &ForecastResult) {
        self.state().pending.insert(
            (forecast.symbol.clone(), forecast.as_of),
            forecast.first_value(),
        );
    }

    /// Score every pending forecast for `series`' symbol whose next bar is
    /// now present. Forecasts for other symbols stay pending.
    pub fn reconcile(&self, series: &BarSeries) -> Result<Vec<CalibrationRecord>, TrendcastError> {
        let symbol = series.symbol();
        let ready: Vec<(PendingKey, f64, NaiveDate, f64)> = {
            let state = self.state();
            state
                .pending
                .iter()
                .filter(|((tracked, _), _)| tracked == symbol)
                .filter_map(|(key, &predicted)| {
                    series
                        .first_after(key.1)
                        .map(|bar| (key.clone(), predicted, bar.date, bar.close))
                })
                .collect()
        };

        let mut records = Vec::with_capacity(ready.len());
        for (key, predicted, date, actual) in ready {
            let record = self.record_and_check(date, predicted, actual)?;
            self.state().pending.remove(&key);
            records.push(record);
        }
        Ok(records)
    }

    pub fn latest(&self) -> Option<CalibrationRecord> {
        self.state().log.last().copied()
    }

    pub fn records(&self) -> Vec<CalibrationRecord> {
        self.state().log.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    pub fn mean_error_pct(&self) -> Option<f64> {
        let state = self.state();
        if state.log.is_empty() {
            return None;
        }
        let total: f64 = state.log.iter().map(|r| r.error_pct).sum();
        Some(total / state.log.len() as f64)
    }

    /// High when the most recent record tripped the threshold.
    pub fn recommended_aggressiveness(&self) -> Aggressiveness {
        match self.latest() {
            Some(r) if r.recalibration_triggered => Aggressiveness::High,
            _ => Aggressiveness::Low,
        }
    }

    /// Clear the log and all pending forecasts.
    pub fn reset(&self) {
        let mut state = self.state();
        state.log.clear();
        state.pending.clear();
    }
}
