//! Weighted polynomial trend model.
//!
//! Each observation's weight rises linearly from `weight_floor` at the
//! oldest close to 1.0 at the most recent, so the latest sessions dominate
//! the least-squares objective and yesterday's close visibly moves the curve.

use super::lstsq::{fit_polynomial, FitError, PolynomialFit};
use super::{FitProfile, ModelKind, Projection, TrendModel};

/// Linear ramp from `floor` (oldest) to 1.0 (newest).
pub fn recency_weights(n: usize, floor: f64) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let span = (n - 1) as f64;
    (0..n)
        .map(|i| floor + (1.0 - floor) * i as f64 / span)
        .collect()
}

pub fn fit_weighted(closes: &[f64], profile: FitProfile) -> Result<PolynomialFit, FitError> {
    let weights = recency_weights(closes.len(), profile.weight_floor);
    fit_polynomial(closes, &weights, profile.degree)
}

#[derive(Debug, Default)]
pub struct WeightedPolynomial;

impl TrendModel for WeightedPolynomial {
    fn kind(&self) -> ModelKind {
        ModelKind::WeightedPolynomial
    }

    fn min_points(&self, profile: FitProfile) -> usize {
        profile.degree + 1
    }

    fn project(
        &self,
        closes: &[f64],
        profile: FitProfile,
        horizon: usize,
    ) -> Result<Projection, FitError> {
        let fit = fit_weighted(closes, profile)?;
        let n = closes.len();
        let values = (n..n + horizon).map(|i| fit.evaluate(i as f64)).collect();
        Ok(Projection {
            values,
            fit_degree: fit.degree(),
        })
    }
}
