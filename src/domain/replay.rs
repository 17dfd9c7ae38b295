//! Walk-forward replay of the calibration loop over a historical series.
//!
//! For each day after the warmup the analyzer sees only the bars up to that
//! day: it scores yesterday's forecast against today's close, picks the
//! aggressiveness the monitor advises, and forecasts again.

use crate::domain::analysis::{AnalysisConfig, Analyzer};
use crate::domain::bar_series::BarSeries;
use crate::domain::calibration::CalibrationRecord;
use crate::domain::error::TrendcastError;
use crate::domain::forecast::Aggressiveness;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub cycles: usize,
    pub records: Vec<CalibrationRecord>,
    /// Cycles that ran at high aggressiveness.
    pub escalations: usize,
    pub mean_error_pct: Option<f64>,
    pub final_aggressiveness: Aggressiveness,
}

impl ReplayReport {
    pub fn triggered_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.recalibration_triggered)
            .count()
    }
}

pub fn replay(
    series: &BarSeries,
    config: AnalysisConfig,
    warmup: usize,
) -> Result<ReplayReport, TrendcastError> {
    if warmup == 0 || warmup > series.len() {
        return Err(TrendcastError::InsufficientData {
            required: warmup.max(1),
            available: series.len(),
        });
    }

    let analyzer = Analyzer::new(config);
    let mut escalations = 0;
    let mut cycles = 0;

    for end in warmup..=series.len() {
        let window = series.truncate_to(end);
        let analysis = analyzer.run_calibrated_cycle(&window)?;
        if let Err(e) = analysis.forecast {
            return Err(e);
        }
        if analysis.aggressiveness == Aggressiveness::High {
            escalations += 1;
        }
        cycles += 1;
    }

    let monitor = analyzer.monitor();
    let report = ReplayReport {
        cycles,
        records: monitor.records(),
        escalations,
        mean_error_pct: monitor.mean_error_pct(),
        final_aggressiveness: monitor.recommended_aggressiveness(),
    };

    info!(
        symbol = series.symbol(),
        cycles,
        scored = report.records.len(),
        escalations,
        "replay complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    fn make_series(closes: &[f64]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect();
        BarSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn warmup_beyond_series_is_insufficient() {
        let series = make_series(&[10.0, 11.0]);
        let err = replay(&series, AnalysisConfig::default(), 5).unwrap_err();
        assert!(matches!(err, TrendcastError::InsufficientData { .. }));
    }

    #[test]
    fn warmup_shorter_than_fit_is_insufficient() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let err = replay(&make_series(&closes), AnalysisConfig::default(), 2).unwrap_err();
        assert!(matches!(
            err,
            TrendcastError::InsufficientData {
                required: 4,
                available: 2
            }
        ));
    }

    #[test]
    fn linear_series_never_escalates() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let report = replay(&make_series(&closes), AnalysisConfig::default(), 25).unwrap();

        assert_eq!(report.cycles, 16);
        // Every cycle but the last is scored by the following bar.
        assert_eq!(report.records.len(), 15);
        assert_eq!(report.escalations, 0);
        assert_eq!(report.triggered_count(), 0);
        assert!(report.mean_error_pct.unwrap() < 1e-6);
        assert_eq!(report.final_aggressiveness, Aggressiveness::Low);
    }

    #[test]
    fn shock_escalates_next_cycle() {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        closes.push(60.0);
        closes.push(61.0);
        let report = replay(&make_series(&closes), AnalysisConfig::default(), 30).unwrap();

        assert_eq!(report.cycles, 3);
        assert!(report.records[0].recalibration_triggered);
        assert!(report.escalations >= 1);
    }
}
