//! Market regime classification from the volatility index.
//!
//! A stateless function of the input: each date is classified
//! independently by thresholding the index level. Nothing is persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Normal,
    Crisis,
}

/// Classify one date. A missing index observation reads as Normal:
/// absence of data is not evidence of stress.
pub fn classify_regime(vix: f64, crisis_threshold: f64) -> Regime {
    if vix.is_finite() && vix > crisis_threshold {
        Regime::Crisis
    } else {
        Regime::Normal
    }
}

/// Classify a slice of index observations.
pub fn regimes_for(vix: &[f64], crisis_threshold: f64) -> Vec<Regime> {
    vix.iter()
        .map(|&v| classify_regime(v, crisis_threshold))
        .collect()
}
