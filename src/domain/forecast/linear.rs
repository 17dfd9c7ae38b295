//! Unweighted ordinary-least-squares line, the fallback trend model.

use super::lstsq::{fit_polynomial, FitError};
use super::{FitProfile, ModelKind, Projection, TrendModel};

#[derive(Debug, Default)]
pub struct LinearTrend;

impl TrendModel for LinearTrend {
    fn kind(&self) -> ModelKind {
        ModelKind::LinearFallback
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
        let weights = vec![1.0; closes.len()];
        let fit = fit_polynomial(closes, &weights, 1)?;
        let n = closes.len();
        Ok(Projection {
            values: (n..n + horizon).map(|i| fit.evaluate(i as f64)).collect(),
            fit_degree: 1,
        })
    }
}
