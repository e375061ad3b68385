//! Normalized spread construction for an admitted pair.
//!
//! raw_spread[t] = A[t] - beta * B[t] - alpha. The z-score normalizes the
//! raw spread against a trailing window of `rolling_window` observations
//! ending at t inclusive, so only past-and-current data ever enters a
//! z-score. Rolling mean and variance are maintained incrementally with a
//! sliding sum / sum-of-squares accumulator rather than recomputed per
//! date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Per-date spread observation.
///
/// `z_score` is `None` until the trailing window has filled (the first
/// `rolling_window - 1` observed points) and on dates with a missing
/// price on either leg; such dates are excluded from trading eligibility
/// downstream. This is a documented edge case, not an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpreadSnapshot {
    pub date: NaiveDate,
    pub raw_spread: f64,
    pub z_score: Option<f64>,
}

/// Sliding-window accumulator over the most recent finite spreads.
#[derive(Debug)]
struct RollingStats {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl RollingStats {
    fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window + 1),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    fn push(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;
        if self.values.len() > self.window {
            let evicted = self.values.pop_front().unwrap_or(0.0);
            self.sum -= evicted;
            self.sum_sq -= evicted * evicted;
        }
    }

    /// Z-score of the newest value once the window is full.
    fn z_score(&self, value: f64) -> Option<f64> {
        if self.values.len() < self.window {
            return None;
        }
        let n = self.window as f64;
        let mean = self.sum / n;
        // Population variance; clamp tiny negatives from cancellation.
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        let std_dev = variance.sqrt();
        if std_dev <= 0.0 || !std_dev.is_finite() {
            return None;
        }
        let z = (value - mean) / std_dev;
        z.is_finite().then_some(z)
    }
}

#[derive(Debug, Clone)]
pub struct SpreadModel {
    rolling_window: usize,
}

impl SpreadModel {
    pub fn new(rolling_window: usize) -> Self {
        Self { rolling_window }
    }

    /// Build the spread series for aligned slices of both legs.
    ///
    /// Missing observations (NaN on either leg) yield a NaN raw spread
    /// and no z-score; the rolling window slides over observed spreads
    /// only, so a gap does not reset the statistics.
    pub fn build(
        &self,
        dates: &[NaiveDate],
        closes_a: &[f64],
        closes_b: &[f64],
        hedge_ratio: f64,
        intercept: f64,
    ) -> Vec<SpreadSnapshot> {
        let len = dates.len().min(closes_a.len()).min(closes_b.len());
        let mut stats = RollingStats::new(self.rolling_window);
        let mut snapshots = Vec::with_capacity(len);

        for i in 0..len {
            let raw = closes_a[i] - hedge_ratio * closes_b[i] - intercept;
            let z_score = if raw.is_finite() {
                stats.push(raw);
                stats.z_score(raw)
            } else {
                None
            };
            snapshots.push(SpreadSnapshot {
                date: dates[i],
                raw_spread: raw,
                z_score,
            });
        }

        snapshots
    }
}
