//! Weighted least-squares polynomial fitting.
//!
//! Solves the weighted normal equations (XᵀWX)β = XᵀWy with Gaussian
//! elimination and partial pivoting. Abscissae are scaled to [0, 1] before
//! building the Vandermonde terms so a cubic over a few hundred points
//! stays well conditioned.

use ndarray::{Array1, Array2};

/// Relative pivot size below which the system is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("need at least {required} points, have {available}")]
    Insufficient { required: usize, available: usize },

    #[error("normal equations are singular")]
    Singular,

    #[error("model unavailable: {0}")]
    Unavailable(String),
}

/// A fitted polynomial in scaled index space.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialFit {
    /// Coefficients in ascending power order over the scaled abscissa.
    pub coefficients: Vec<f64>,
    scale: f64,
}

impl PolynomialFit {
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluate at a raw (unscaled) index.
    pub fn evaluate(&self, index: f64) -> f64 {
        let t = index / self.scale;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }
}

/// Fit a degree-`degree` polynomial to `(i, y[i])` for `i in 0..n`,
/// weighting each squared residual by `weights[i]`.
pub fn fit_polynomial(y: &[f64], weights: &[f64], degree: usize) -> Result<PolynomialFit, FitError> {
    let n = y.len();
    let terms = degree + 1;
    if n < terms {
        return Err(FitError::Insufficient {
            required: terms,
            available: n,
        });
    }
    debug_assert_eq!(weights.len(), n);

    let scale = if n > 1 { (n - 1) as f64 } else { 1.0 };

    let mut xtwx = Array2::<f64>::zeros((terms, terms));
    let mut xtwy = Array1::<f64>::zeros(terms);

    for (i, (&yi, &wi)) in y.iter().zip(weights).enumerate() {
        let t = i as f64 / scale;
        let mut powers = Vec::with_capacity(2 * terms - 1);
        let mut p = 1.0;
        for _ in 0..(2 * terms - 1) {
            powers.push(p);
            p *= t;
        }
        for r in 0..terms {
            xtwy[r] += wi * powers[r] * yi;
            for c in 0..terms {
                xtwx[[r, c]] += wi * powers[r + c];
            }
        }
    }

    let coefficients = solve(xtwx, xtwy)?;
    Ok(PolynomialFit {
        coefficients: coefficients.to_vec(),
        scale,
    })
}

fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, FitError> {
    let n = b.len();
    let magnitude = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if magnitude == 0.0 {
        return Err(FitError::Singular);
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot_row, col]].abs() <= PIVOT_TOLERANCE * magnitude {
            return Err(FitError::Singular);
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }
    Ok(x)
}
