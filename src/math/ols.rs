//! Simple linear regression with intercept.
//!
//! y[i] = intercept + slope * x[i] + e[i]

use super::MathError;

/// Minimum observations for a meaningful fit.
const MIN_OBSERVATIONS: usize = 3;

/// Relative variance floor below which the regressor is treated as constant.
const VARIANCE_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct OlsFit {
    pub slope: f64,
    pub intercept: f64,
    /// Residuals in input order.
    pub residuals: Vec<f64>,
}

/// Fit `y = intercept + slope * x` by ordinary least squares.
///
/// Inputs must be the same length and free of NaN; callers are expected to
/// pre-filter missing observations.
pub fn fit(y: &[f64], x: &[f64]) -> Result<OlsFit, MathError> {
    if y.len() != x.len() || y.len() < MIN_OBSERVATIONS {
        return Err(MathError::TooFewObservations {
            needed: MIN_OBSERVATIONS,
            actual: y.len().min(x.len()),
        });
    }

    let n = y.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        sxx += dx * dx;
        sxy += dx * (yi - mean_y);
    }

    // Scale-aware singularity check: constant regressor has no slope.
    let scale = mean_x * mean_x * n + 1.0;
    if sxx <= VARIANCE_FLOOR * scale {
        return Err(MathError::Singular(
            "regressor has zero variance".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let residuals: Vec<f64> = y
        .iter()
        .zip(x.iter())
        .map(|(&yi, &xi)| yi - intercept - slope * xi)
        .collect();

    if !slope.is_finite() || !intercept.is_finite() {
        return Err(MathError::Singular(
            "non-finite regression coefficients".to_string(),
        ));
    }

    Ok(OlsFit {
        slope,
        intercept,
        residuals,
    })
}
