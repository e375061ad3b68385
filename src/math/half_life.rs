//! Mean-reversion half-life from an AR(1) fit.
//!
//! Fits `Δs[t] = c + λ * s[t-1] + ε` by OLS and converts the reversion
//! speed to a half-life in periods:
//!
//! ```text
//! half_life = -ln(2) / ln(1 + λ)     for λ in (-1, 0)
//! ```
//!
//! λ >= 0 means the series never reverts: the half-life is +infinity,
//! which is a valid output, not an error. λ <= -1 over-corrects past the
//! mean within one period and maps to 0.

use super::ols;

/// Estimate the half-life of mean reversion in periods.
///
/// Returns +infinity for non-mean-reverting or degenerate input; callers
/// use the value as a gating filter, so degenerate spreads simply fail
/// the filter.
pub fn estimate_half_life(spread: &[f64]) -> f64 {
    if spread.len() < 4 {
        return f64::INFINITY;
    }

    let n = spread.len() - 1;
    let mut delta: Vec<f64> = Vec::with_capacity(n);
    let mut lag: Vec<f64> = Vec::with_capacity(n);
    for i in 1..spread.len() {
        delta.push(spread[i] - spread[i - 1]);
        lag.push(spread[i - 1]);
    }

    let lambda = match ols::fit(&delta, &lag) {
        Ok(fit) => fit.slope,
        Err(_) => return f64::INFINITY,
    };

    if !lambda.is_finite() || lambda >= 0.0 {
        return f64::INFINITY;
    }
    if lambda <= -1.0 {
        return 0.0;
    }

    -std::f64::consts::LN_2 / (1.0 + lambda).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Seeded linear congruential generator, uniform in [-0.5, 0.5).
    fn lcg(seed: u64) -> impl FnMut() -> f64 {
        let mut state = seed;
        move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
        }
    }

    /// Synthetic AR(1): s[t] = (1 + lambda) * s[t-1] + noise.
    fn ar1_series(lambda: f64, n: usize) -> Vec<f64> {
        let mut noise = lcg(7);
        let mut series = Vec::with_capacity(n);
        let mut current = 5.0;
        for _ in 0..n {
            current = (1.0 + lambda) * current + noise();
            series.push(current);
        }
        series
    }

    #[test]
    fn test_recovers_known_lambda() {
        let lambda = -0.3;
        let series = ar1_series(lambda, 500);
        let expected = -std::f64::consts::LN_2 / (1.0 + lambda).ln();
        let estimated = estimate_half_life(&series);
        assert!(
            (estimated - expected).abs() < 0.5,
            "expected ~{:.2}, got {:.2}",
            expected,
            estimated
        );
    }

    #[test]
    fn test_fast_reversion_has_short_half_life() {
        let series = ar1_series(-0.7, 500);
        let hl = estimate_half_life(&series);
        assert!(hl < 1.0, "strong reversion should be sub-period, got {}", hl);
    }

    #[test]
    fn test_long_half_life_fails_trading_filter() {
        // Very slow reversion: lambda = -0.005 gives a ~138-period half-life.
        let series = ar1_series(-0.005, 500);
        let hl = estimate_half_life(&series);
        assert!(hl > 20.0, "slow reversion should fail the filter, got {}", hl);
    }

    #[test]
    fn test_constant_series_is_infinite() {
        let series = vec![3.0; 100];
        assert!(estimate_half_life(&series).is_infinite());
    }

    #[test]
    fn test_too_short_is_infinite() {
        assert!(estimate_half_life(&[1.0, 2.0, 1.5]).is_infinite());
    }
}
