//! Additive seasonal model: OLS linear trend plus a per-phase residual profile.
//!
//! The seasonal profile is the mean detrended residual for each phase
//! `i % season_length`, centred to sum to zero, and repeats across the
//! horizon on top of the extrapolated trend.

use super::lstsq::{fit_polynomial, FitError};
use super::{FitProfile, ModelKind, Projection, TrendModel};

#[derive(Debug)]
pub struct SeasonalTrend {
    season_length: usize,
}

impl SeasonalTrend {
    /// Fails when the season is too short to carry a pattern.
    pub fn init(season_length: usize) -> Result<Self, FitError> {
        if season_length < 2 {
            return Err(FitError::Unavailable(format!(
                "season_length must be >= 2, got {}",
                season_length
            )));
        }
        Ok(Self { season_length })
    }

    pub fn season_length(&self) -> usize {
        self.season_length
    }
}

impl TrendModel for SeasonalTrend {
    fn kind(&self) -> ModelKind {
        ModelKind::SeasonalFallback
    }

    fn min_points(&self, _profile: FitProfile) -> usize {
        2
    }

    fn project(
        &self,
        closes: &[f64],
        _profile: FitProfile,
        horizon: usize,
    ) -> Result<Projection, FitError> {
        let n = closes.len();
        let period = self.season_length;
        if n < 2 * period {
            return Err(FitError::Unavailable(format!(
                "need two full seasons ({} points), have {}",
                2 * period,
                n
            )));
        }

        let trend = fit_polynomial(closes, &vec![1.0; n], 1)?;

        let mut sums = vec![0.0; period];
        let mut counts = vec![0usize; period];
        for (i, &close) in closes.iter().enumerate() {
            sums[i % period] += close - trend.evaluate(i as f64);
            counts[i % period] += 1;
        }
        let mut profile: Vec<f64> = sums
            .iter()
            .zip(&counts)
            .map(|(s, &c)| s / c as f64)
            .collect();
        let centre = profile.iter().sum::<f64>() / period as f64;
        for p in &mut profile {
            *p -= centre;
        }

        let values = (n..n + horizon)
            .map(|i| trend.evaluate(i as f64) + profile[i % period])
            .collect();
        Ok(Projection {
            values,
            fit_degree: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PROFILE: FitProfile = FitProfile {
        degree: 3,
        weight_floor: 0.1,
    };

    #[test]
    fn init_rejects_short_season() {
        assert!(matches!(
            SeasonalTrend::init(1).unwrap_err(),
            FitError::Unavailable(_)
        ));
        assert_eq!(SeasonalTrend::init(5).unwrap().season_length(), 5);
    }

    #[test]
    fn needs_two_seasons() {
        let model = SeasonalTrend::init(5).unwrap();
        let err = model.project(&[1.0; 9], PROFILE, 3).unwrap_err();
        assert!(matches!(err, FitError::Unavailable(_)));
    }

    #[test]
    fn pure_trend_has_flat_profile() {
        let model = SeasonalTrend::init(5).unwrap();
        let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let proj = model.project(&closes, PROFILE, 2).unwrap();
        assert_relative_eq!(proj.values[0], 30.0, epsilon = 1e-9);
        assert_relative_eq!(proj.values[1], 31.0, epsilon = 1e-9);
    }

    #[test]
    fn repeats_alternating_pattern() {
        let model = SeasonalTrend::init(2).unwrap();
        let closes: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 101.0 } else { 99.0 })
            .collect();
        let proj = model.project(&closes, PROFILE, 4).unwrap();
        // Next index 20 is an even phase: above the trend.
        assert!(proj.values[0] > proj.values[1]);
        assert!(proj.values[2] > proj.values[3]);
        assert_eq!(proj.fit_degree, 1);
    }
}
