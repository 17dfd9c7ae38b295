//! One analysis cycle: indicators, signal, calibration and forecast.

use crate::domain::bar_series::BarSeries;
use crate::domain::calibration::{CalibrationMonitor, CalibrationRecord, DEFAULT_THRESHOLD_PCT};
use crate::domain::error::TrendcastError;
use crate::domain::forecast::{Aggressiveness, ForecastConfig, ForecastEngine, ForecastResult};
use crate::domain::indicator::{IndicatorConfig, IndicatorRow, IndicatorSet};
use crate::domain::signal::{self, Action, Signal};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    pub indicators: IndicatorConfig,
    pub forecast: ForecastConfig,
    pub threshold_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorConfig::default(),
            forecast: ForecastConfig::default(),
            threshold_pct: DEFAULT_THRESHOLD_PCT,
        }
    }
}

#[derive(Debug)]
pub struct Analysis {
    pub last_close: f64,
    pub indicators: IndicatorSet,
    pub signal: Signal,
    pub action: Action,
    /// `InsufficientData` when the series is too short for the fit. The
    /// indicators and signal are still reported in that case.
    pub forecast: Result<ForecastResult, TrendcastError>,
    /// Records produced by scoring earlier forecasts against this series.
    pub reconciled: Vec<CalibrationRecord>,
    pub aggressiveness: Aggressiveness,
}

impl Analysis {
    pub fn latest_indicators(&self) -> Option<&IndicatorRow> {
        self.indicators.latest()
    }
}

#[derive(Debug)]
pub struct Analyzer {
    config: AnalysisConfig,
    engine: ForecastEngine,
    monitor: CalibrationMonitor,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            engine: ForecastEngine::new(config.forecast),
            monitor: CalibrationMonitor::new(config.threshold_pct),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    pub fn monitor(&self) -> &CalibrationMonitor {
        &self.monitor
    }

    /// Run one cycle over `series`.
    ///
    /// Pending forecasts are scored first. The forecast then runs at
    /// `aggressiveness` and is tracked for scoring on a later cycle.
    pub fn run_cycle(
        &self,
        series: &BarSeries,
        aggressiveness: Aggressiveness,
    ) -> Result<Analysis, TrendcastError> {
        let reconciled = self.monitor.reconcile(series)?;
        self.cycle(series, reconciled, aggressiveness)
    }

    /// Run a cycle at whatever aggressiveness the monitor advises once
    /// pending forecasts have been scored.
    pub fn run_calibrated_cycle(&self, series: &BarSeries) -> Result<Analysis, TrendcastError> {
        let reconciled = self.monitor.reconcile(series)?;
        let aggressiveness = self.monitor.recommended_aggressiveness();
        self.cycle(series, reconciled, aggressiveness)
    }

    fn cycle(
        &self,
        series: &BarSeries,
        reconciled: Vec<CalibrationRecord>,
        aggressiveness: Aggressiveness,
    ) -> Result<Analysis, TrendcastError> {
        let last = series.last().ok_or_else(|| TrendcastError::NoDataAvailable {
            symbol: series.symbol().to_string(),
            reason: "empty series".into(),
        })?;

        let indicators = IndicatorSet::compute(series, self.config.indicators);
        let (signal, action) = match indicators.latest() {
            Some(row) => {
                let s = signal::evaluate(last.close, row);
                (s, s.action(row.rsi))
            }
            None => (Signal::Neutral, Action::Hold),
        };

        let forecast = match self
            .engine
            .forecast(series, self.config.forecast.horizon, aggressiveness)
        {
            Ok(forecast) => {
                self.monitor.track(&forecast);
                info!(
                    symbol = series.symbol(),
                    close = last.close,
                    %signal,
                    %action,
                    model = %forecast.model_kind,
                    next = forecast.first_value(),
                    "analysis cycle complete"
                );
                Ok(forecast)
            }
            Err(e @ TrendcastError::InsufficientData { .. }) => {
                warn!(
                    symbol = series.symbol(),
                    %signal,
                    error = %e,
                    "analysis cycle complete without forecast"
                );
                Err(e)
            }
            Err(e) => return Err(e),
        };

        Ok(Analysis {
            last_close: last.close,
            indicators,
            signal,
            action,
            forecast,
            reconciled,
            aggressiveness,
        })
    }

    /// Forget all calibration state.
    pub fn reset(&self) {
        self.monitor.reset();
    }
}
