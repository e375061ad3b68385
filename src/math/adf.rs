//! Dickey-Fuller unit-root test with MacKinnon p-values.
//!
//! Tests whether a series is stationary (mean-reverting) by regressing
//! its first differences on the lagged level:
//!
//! ```text
//! Δy[t] = c + γ * y[t-1] + ε     H0: γ = 0 (unit root)
//! ```
//!
//! The t-statistic on γ is mapped to a p-value with the MacKinnon (1994)
//! regression-surface approximation for the constant-only case, so the
//! usual thresholds hold: a statistic of -2.86 maps to p ≈ 0.05.

use super::MathError;
use statrs::function::erf::erf;

/// Minimum observations for a reliable test.
const MIN_OBSERVATIONS: usize = 20;

/// MacKinnon (1994) approximation bounds for the constant-only case.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;

/// Polynomial coefficients for the small-p region (statistic <= TAU_STAR).
const SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];

/// Polynomial coefficients for the large-p region (statistic > TAU_STAR).
const LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

#[derive(Debug, Clone, Copy)]
pub struct UnitRootTest {
    /// t-statistic on the lagged level (more negative = more stationary).
    pub statistic: f64,
    /// MacKinnon approximate p-value for H0: unit root.
    pub p_value: f64,
}

/// Standard normal CDF.
fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// MacKinnon (1994) approximate asymptotic p-value for the constant-only
/// Dickey-Fuller distribution.
fn mackinnon_p(statistic: f64) -> f64 {
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let z = if statistic <= TAU_STAR {
        SMALL_P[0] + SMALL_P[1] * statistic + SMALL_P[2] * statistic * statistic
    } else {
        LARGE_P[0]
            + LARGE_P[1] * statistic
            + LARGE_P[2] * statistic * statistic
            + LARGE_P[3] * statistic * statistic * statistic
    };
    norm_cdf(z)
}

/// Run the Dickey-Fuller test on `series`.
///
/// Deterministic: identical input always yields the identical statistic.
pub fn dickey_fuller(series: &[f64]) -> Result<UnitRootTest, MathError> {
    if series.len() < MIN_OBSERVATIONS {
        return Err(MathError::TooFewObservations {
            needed: MIN_OBSERVATIONS,
            actual: series.len(),
        });
    }

    let n = series.len() - 1;
    let n_f64 = n as f64;

    let mut delta_y: Vec<f64> = Vec::with_capacity(n);
    let mut y_lag: Vec<f64> = Vec::with_capacity(n);
    for i in 1..series.len() {
        delta_y.push(series[i] - series[i - 1]);
        y_lag.push(series[i - 1]);
    }

    // Demeaning both sides fits the constant implicitly.
    let y_lag_mean = y_lag.iter().sum::<f64>() / n_f64;
    let delta_y_mean = delta_y.iter().sum::<f64>() / n_f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for i in 0..n {
        let y_centered = y_lag[i] - y_lag_mean;
        numerator += y_centered * (delta_y[i] - delta_y_mean);
        denominator += y_centered * y_centered;
    }

    if denominator.abs() < f64::EPSILON {
        return Err(MathError::Singular(
            "lagged series has zero variance".to_string(),
        ));
    }

    let gamma = numerator / denominator;

    let mut sse = 0.0;
    for i in 0..n {
        let predicted = gamma * (y_lag[i] - y_lag_mean) + delta_y_mean;
        let residual = delta_y[i] - predicted;
        sse += residual * residual;
    }

    // Two fitted parameters: constant and gamma.
    let dof = n_f64 - 2.0;
    let mse = sse / dof;
    let se_gamma = (mse / denominator).sqrt();

    if se_gamma.abs() < f64::EPSILON || !se_gamma.is_finite() {
        return Err(MathError::Singular(
            "zero standard error in unit-root regression".to_string(),
        ));
    }

    let statistic = gamma / se_gamma;
    let p_value = mackinnon_p(statistic);

    Ok(UnitRootTest { statistic, p_value })
}
