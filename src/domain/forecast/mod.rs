//! Trend forecasting over closing prices.
//!
//! The engine picks its trend model once, at construction: the configured
//! primary model if it initializes, otherwise the unweighted linear fallback.
//! The model that actually produced a forecast is reported in
//! [`ForecastResult::model_kind`]. A singular weighted system at fit time
//! also degrades to the linear fallback.
//!
//! The uncertainty band is the sample standard deviation of the trailing
//! `band_window` closes, applied uniformly to every horizon step. It is a
//! static envelope, not a widening prediction interval.

pub mod linear;
pub mod lstsq;
pub mod polynomial;
pub mod seasonal;

use crate::domain::bar_series::BarSeries;
use crate::domain::error::TrendcastError;
use crate::domain::indicator::stddev::sample_stddev;
use chrono::{Datelike, NaiveDate, Weekday};
use linear::LinearTrend;
use lstsq::FitError;
use polynomial::WeightedPolynomial;
use seasonal::SeasonalTrend;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// How responsive the trend fit should be to recent moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggressiveness {
    #[default]
    Low,
    High,
}

impl fmt::Display for Aggressiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggressiveness::Low => write!(f, "low"),
            Aggressiveness::High => write!(f, "high"),
        }
    }
}

/// Degree and recency-weight floor used for one fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitProfile {
    pub degree: usize,
    pub weight_floor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    WeightedPolynomial,
    LinearFallback,
    SeasonalFallback,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::WeightedPolynomial => write!(f, "weighted-polynomial"),
            ModelKind::LinearFallback => write!(f, "linear-fallback"),
            ModelKind::SeasonalFallback => write!(f, "seasonal-fallback"),
        }
    }
}

/// Which trend model the engine should try to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelChoice {
    #[default]
    Polynomial,
    Seasonal,
    Linear,
}

impl FromStr for ModelChoice {
    type Err = TrendcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "polynomial" => Ok(ModelChoice::Polynomial),
            "seasonal" => Ok(ModelChoice::Seasonal),
            "linear" => Ok(ModelChoice::Linear),
            other => Err(TrendcastError::invalid(
                "forecast",
                "model",
                format!(
                    "unknown model '{}' (expected polynomial, seasonal or linear)",
                    other
                ),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastConfig {
    pub horizon: usize,
    pub model: ModelChoice,
    pub low: FitProfile,
    pub high: FitProfile,
    pub band_window: usize,
    pub season_length: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 7,
            model: ModelChoice::Polynomial,
            low: FitProfile {
                degree: 3,
                weight_floor: 0.1,
            },
            high: FitProfile {
                degree: 3,
                weight_floor: 0.01,
            },
            band_window: 20,
            season_length: 5,
        }
    }
}

impl ForecastConfig {
    pub fn profile(&self, aggressiveness: Aggressiveness) -> FitProfile {
        match aggressiveness {
            Aggressiveness::Low => self.low,
            Aggressiveness::High => self.high,
        }
    }
}

/// Output of a single model run.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub values: Vec<f64>,
    pub fit_degree: usize,
}

/// A trend model strategy.
pub trait TrendModel: fmt::Debug + Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Fewest closes the model can fit for `profile`.
    fn min_points(&self, profile: FitProfile) -> usize;

    fn project(
        &self,
        closes: &[f64],
        profile: FitProfile,
        horizon: usize,
    ) -> Result<Projection, FitError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub symbol: String,
    pub horizon: usize,
    pub values: Vec<f64>,
    pub band_half_width: f64,
    pub model_kind: ModelKind,
    pub fit_degree: usize,
    /// Date of the last bar the model was fitted on.
    pub as_of: NaiveDate,
}

impl ForecastResult {
    pub fn first_value(&self) -> f64 {
        self.values[0]
    }

    pub fn upper(&self) -> Vec<f64> {
        self.values.iter().map(|v| v + self.band_half_width).collect()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.values.iter().map(|v| v - self.band_half_width).collect()
    }

    /// The next `horizon` weekdays after `as_of`.
    pub fn target_dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(self.horizon);
        let mut d = self.as_of;
        while dates.len() < self.horizon {
            d = match d.succ_opt() {
                Some(next) => next,
                None => break,
            };
            if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
                dates.push(d);
            }
        }
        dates
    }
}

#[derive(Debug)]
pub struct ForecastEngine {
    config: ForecastConfig,
    primary: Box<dyn TrendModel>,
    fallback: LinearTrend,
}

impl ForecastEngine {
    /// Select the trend model once. A primary model that fails to
    /// initialize is replaced by the linear fallback.
    pub fn new(config: ForecastConfig) -> Self {
        let primary: Box<dyn TrendModel> = match config.model {
            ModelChoice::Polynomial => Box::new(WeightedPolynomial),
            ModelChoice::Linear => Box::new(LinearTrend),
            ModelChoice::Seasonal => match SeasonalTrend::init(config.season_length) {
                Ok(model) => Box::new(model),
                Err(e) => {
                    warn!(error = %e, "seasonal model unavailable, using linear fallback");
                    Box::new(LinearTrend)
                }
            },
        };
        Self {
            config,
            primary,
            fallback: LinearTrend,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// The model selected at construction.
    pub fn active_model(&self) -> ModelKind {
        self.primary.kind()
    }

    /// Project `horizon` closes past the end of `series`.
    pub fn forecast(
        &self,
        series: &BarSeries,
        horizon: usize,
        aggressiveness: Aggressiveness,
    ) -> Result<ForecastResult, TrendcastError> {
        if horizon == 0 {
            return Err(TrendcastError::invalid(
                "forecast",
                "horizon",
                "horizon must be positive",
            ));
        }

        let closes = series.closes();
        let profile = self.config.profile(aggressiveness);
        let required = self.primary.min_points(profile);
        let last = match series.last() {
            Some(bar) if closes.len() >= required => bar,
            _ => {
                return Err(TrendcastError::InsufficientData {
                    required,
                    available: closes.len(),
                });
            }
        };
        if let Some(bad) = closes.iter().find(|c| !c.is_finite() || **c <= 0.0) {
            return Err(TrendcastError::degenerate(format!(
                "close {} is not a positive finite price",
                bad
            )));
        }

        let band_half_width = trailing_band(&closes, self.config.band_window);

        // Zero variance: any fit is the constant itself.
        if closes.iter().all(|&c| c == closes[0]) {
            debug!(symbol = series.symbol(), "flat series, returning constant forecast");
            return Ok(ForecastResult {
                symbol: series.symbol().to_string(),
                horizon,
                values: vec![closes[0]; horizon],
                band_half_width,
                model_kind: self.primary.kind(),
                fit_degree: self.nominal_degree(profile),
                as_of: last.date,
            });
        }

        let (projection, model_kind) = match self.primary.project(&closes, profile, horizon) {
            Ok(p) => (p, self.primary.kind()),
            Err(FitError::Insufficient {
                required,
                available,
            }) => return Err(TrendcastError::InsufficientData { required, available }),
            Err(e) => {
                warn!(
                    symbol = series.symbol(),
                    model = %self.primary.kind(),
                    error = %e,
                    "primary model failed, using linear fallback"
                );
                let p = self
                    .fallback
                    .project(&closes, profile, horizon)
                    .map_err(fit_error)?;
                (p, self.fallback.kind())
            }
        };

        debug!(
            symbol = series.symbol(),
            model = %model_kind,
            degree = projection.fit_degree,
            %aggressiveness,
            "forecast fitted"
        );

        Ok(ForecastResult {
            symbol: series.symbol().to_string(),
            horizon,
            values: projection.values,
            band_half_width,
            model_kind,
            fit_degree: projection.fit_degree,
            as_of: last.date,
        })
    }

    fn nominal_degree(&self, profile: FitProfile) -> usize {
        match self.primary.kind() {
            ModelKind::WeightedPolynomial => profile.degree.max(1),
            ModelKind::LinearFallback | ModelKind::SeasonalFallback => 1,
        }
    }
}

fn trailing_band(closes: &[f64], window: usize) -> f64 {
    let start = closes.len().saturating_sub(window);
    sample_stddev(&closes[start..])
}

fn fit_error(err: FitError) -> TrendcastError {
    match err {
        FitError::Insufficient {
            required,
            available,
        } => TrendcastError::InsufficientData {
            required,
            available,
        },
        other => TrendcastError::degenerate(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_relative_eq;

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

    fn linear_closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn flat_series_gives_flat_forecast() {
        let engine = ForecastEngine::new(ForecastConfig::default());
        let result = engine
            .forecast(&make_series(&[75.0; 25]), 7, Aggressiveness::Low)
            .unwrap();
        assert_eq!(result.values, vec![75.0; 7]);
        assert_eq!(result.band_half_width, 0.0);
        assert_eq!(result.model_kind, ModelKind::WeightedPolynomial);
        assert_eq!(result.fit_degree, 3);
    }

    #[test]
    fn two_points_cubic_is_insufficient() {
        let engine = ForecastEngine::new(ForecastConfig::default());
        let err = engine
            .forecast(&make_series(&[10.0, 11.0]), 7, Aggressiveness::Low)
            .unwrap_err();
        assert!(matches!(
            err,
            TrendcastError::InsufficientData {
                required: 4,
                available: 2
            }
        ));
    }

    #[test]
    fn empty_series_is_insufficient() {
        let engine = ForecastEngine::new(ForecastConfig::default());
        let err = engine
            .forecast(&make_series(&[]), 7, Aggressiveness::Low)
            .unwrap_err();
        assert!(matches!(err, TrendcastError::InsufficientData { available: 0, .. }));
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let engine = ForecastEngine::new(ForecastConfig::default());
        let err = engine
            .forecast(&make_series(&linear_closes(30)), 0, Aggressiveness::Low)
            .unwrap_err();
        assert!(matches!(err, TrendcastError::ConfigInvalid { .. }));
    }

    #[test]
    fn forecast_has_horizon_values() {
        let engine = ForecastEngine::new(ForecastConfig::default());
        let result = engine
            .forecast(&make_series(&linear_closes(40)), 5, Aggressiveness::Low)
            .unwrap();
        assert_eq!(result.horizon, 5);
        assert_eq!(result.values.len(), 5);
        assert_eq!(result.as_of, NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
    }

    #[test]
    fn band_uses_trailing_window() {
        let engine = ForecastEngine::new(ForecastConfig::default());
        let closes = linear_closes(60);
        let result = engine
            .forecast(&make_series(&closes), 7, Aggressiveness::Low)
            .unwrap();
        assert_relative_eq!(
            result.band_half_width,
            sample_stddev(&closes[40..]),
            epsilon = 1e-12
        );
        let upper = result.upper();
        let lower = result.lower();
        assert_relative_eq!(upper[0] - lower[0], 2.0 * result.band_half_width, epsilon = 1e-9);
    }

    #[test]
    fn seasonal_with_bad_season_degrades_at_selection() {
        let config = ForecastConfig {
            model: ModelChoice::Seasonal,
            season_length: 1,
            ..ForecastConfig::default()
        };
        let engine = ForecastEngine::new(config);
        assert_eq!(engine.active_model(), ModelKind::LinearFallback);
    }

    #[test]
    fn seasonal_short_history_degrades_at_fit() {
        let config = ForecastConfig {
            model: ModelChoice::Seasonal,
            season_length: 10,
            ..ForecastConfig::default()
        };
        let engine = ForecastEngine::new(config);
        assert_eq!(engine.active_model(), ModelKind::SeasonalFallback);
        let result = engine
            .forecast(&make_series(&linear_closes(12)), 3, Aggressiveness::Low)
            .unwrap();
        assert_eq!(result.model_kind, ModelKind::LinearFallback);
        assert_relative_eq!(result.values[0], 112.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_weight_floor_with_two_points_falls_back() {
        // With weight 0 on the oldest point a line through two points is singular.
        let config = ForecastConfig {
            low: FitProfile {
                degree: 1,
                weight_floor: 0.0,
            },
            ..ForecastConfig::default()
        };
        let engine = ForecastEngine::new(config);
        let result = engine
            .forecast(&make_series(&[10.0, 12.0]), 2, Aggressiveness::Low)
            .unwrap();
        assert_eq!(result.model_kind, ModelKind::LinearFallback);
        assert_relative_eq!(result.values[0], 14.0, epsilon = 1e-9);
    }

    #[test]
    fn aggressiveness_selects_profile() {
        let config = ForecastConfig {
            low: FitProfile {
                degree: 1,
                weight_floor: 0.1,
            },
            high: FitProfile {
                degree: 2,
                weight_floor: 0.01,
            },
            ..ForecastConfig::default()
        };
        let engine = ForecastEngine::new(config);
        let series = make_series(&[10.0, 12.0, 11.0, 15.0, 14.0, 18.0]);
        let low = engine.forecast(&series, 3, Aggressiveness::Low).unwrap();
        let high = engine.forecast(&series, 3, Aggressiveness::High).unwrap();
        assert_eq!(low.fit_degree, 1);
        assert_eq!(high.fit_degree, 2);
    }

    #[test]
    fn target_dates_skip_weekends() {
        let result = ForecastResult {
            symbol: "T".into(),
            horizon: 3,
            values: vec![1.0, 2.0, 3.0],
            band_half_width: 0.0,
            model_kind: ModelKind::LinearFallback,
            fit_degree: 1,
            // Friday
            as_of: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
        };
        assert_eq!(
            result.target_dates(),
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 13).unwrap(),
            ]
        );
    }

    #[test]
    fn model_choice_parses() {
        assert_eq!("Seasonal".parse::<ModelChoice>().unwrap(), ModelChoice::Seasonal);
        assert!("prophet".parse::<ModelChoice>().is_err());
    }

    #[test]
    fn model_kind_display() {
        assert_eq!(ModelKind::WeightedPolynomial.to_string(), "weighted-polynomial");
        assert_eq!(ModelKind::LinearFallback.to_string(), "linear-fallback");
        assert_eq!(ModelKind::SeasonalFallback.to_string(), "seasonal-fallback");
    }
}
