//! Engle-Granger two-step cointegration test for a candidate pair.
//!
//! Step 1: OLS regression of leg A on leg B (with intercept) gives the
//! hedge ratio. Step 2: a Dickey-Fuller unit-root test on the residuals
//! decides whether the spread is stationary.
//!
//! The pair identity is unordered; the constructor normalizes so the
//! lexicographically smaller ticker is always the dependent variable,
//! making `test(A, B)` and `test(B, A)` identical by construction.

use crate::data::Sector;
use crate::math::{self, MathError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::PairError;

/// Unordered pair of sector-mate instruments.
///
/// Leg `a` is always the lexicographically smaller ticker and is the
/// dependent variable in the hedge regression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub a: String,
    pub b: String,
    pub sector: Sector,
}

impl Pair {
    pub fn new(x: &str, y: &str, sector: Sector) -> Self {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        Self {
            a: a.to_string(),
            b: b.to_string(),
            sector,
        }
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// Outcome of one cointegration test. Immutable once created.
///
/// A p-value at or above the admission threshold is a valid
/// "not cointegrated this window" outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CointegrationResult {
    pub pair: Pair,
    /// Hedge ratio beta: spread = A - beta * B - alpha.
    pub hedge_ratio: f64,
    /// Regression intercept alpha.
    pub intercept: f64,
    /// Unit-root t-statistic on the residual spread.
    pub test_statistic: f64,
    /// MacKinnon approximate p-value.
    pub p_value: f64,
    pub window_id: usize,
}

impl CointegrationResult {
    pub fn is_cointegrated(&self, p_threshold: f64) -> bool {
        self.p_value < p_threshold
    }
}

#[derive(Debug, Clone)]
pub struct CointegrationTester {
    min_observations: usize,
}

impl CointegrationTester {
    pub fn new(min_observations: usize) -> Self {
        Self { min_observations }
    }

    /// Test a pair over aligned training slices.
    ///
    /// Dates where either leg is missing are dropped before the
    /// regression; the minimum-sample check applies to what remains.
    pub fn test(
        &self,
        pair: &Pair,
        closes_a: &[f64],
        closes_b: &[f64],
        window_id: usize,
    ) -> Result<CointegrationResult, PairError> {
        let aligned_len = closes_a.len().min(closes_b.len());
        let mut a: Vec<f64> = Vec::with_capacity(aligned_len);
        let mut b: Vec<f64> = Vec::with_capacity(aligned_len);
        for i in 0..aligned_len {
            if closes_a[i].is_finite() && closes_b[i].is_finite() {
                a.push(closes_a[i]);
                b.push(closes_b[i]);
            }
        }

        if a.len() < self.min_observations {
            return Err(PairError::InsufficientData {
                expected: self.min_observations,
                actual: a.len(),
            });
        }

        let fit = math::ols_fit(&a, &b).map_err(|e| self.map_math_error(pair, e))?;
        let unit_root =
            math::dickey_fuller(&fit.residuals).map_err(|e| self.map_math_error(pair, e))?;

        debug!(
            pair = %pair,
            window_id,
            hedge_ratio = format!("{:.4}", fit.slope),
            statistic = format!("{:.3}", unit_root.statistic),
            p_value = format!("{:.4}", unit_root.p_value),
            "Cointegration test complete"
        );

        Ok(CointegrationResult {
            pair: pair.clone(),
            hedge_ratio: fit.slope,
            intercept: fit.intercept,
            test_statistic: unit_root.statistic,
            p_value: unit_root.p_value,
            window_id,
        })
    }

    fn map_math_error(&self, pair: &Pair, error: MathError) -> PairError {
        match error {
            MathError::TooFewObservations { needed, actual } => PairError::InsufficientData {
                expected: needed.max(self.min_observations),
                actual,
            },
            MathError::Singular(reason) => PairError::SingularRegression {
                pair: pair.to_string(),
                reason,
            },
        }
    }
}
