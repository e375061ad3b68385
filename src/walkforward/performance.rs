//! Per-window performance metrics and cross-window aggregation.
//!
//! Equity curves arrive as multiples of the capital allocated to one pair
//! for one window. Metrics are computed from daily marks: annualized
//! Sharpe over 252 trading days, peak-to-trough max drawdown, and the
//! cumulative return over the testing slice. Monetary PnL is reported in
//! `Decimal` against the configured per-pair capital.

use super::persistence::{PersistenceRecord, PersistenceTracker};
use super::windows::WindowSpec;
use crate::discovery::{BacktestConfig, Pair};
use crate::trading::ClosedTrade;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Daily simple returns from an equity curve.
pub fn returns_from_equity(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Annualized Sharpe ratio of a daily return series (zero risk-free).
///
/// Fewer than two observations, or a flat series, yield 0.0 rather than a
/// meaningless ratio.
pub fn sharpe_ratio(daily_returns: &[f64]) -> f64 {
    let n = daily_returns.len();
    if n < 2 {
        return 0.0;
    }
    let mean = daily_returns.iter().sum::<f64>() / n as f64;
    // Sample variance.
    let variance = daily_returns
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / (n as f64 - 1.0);
    let std_dev = variance.sqrt();
    // Constant nonzero returns leave cancellation noise in the variance;
    // the floor is relative to the mean's own scale.
    if std_dev <= mean.abs() * 1e-12 + f64::EPSILON || !std_dev.is_finite() {
        return 0.0;
    }
    mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum peak-to-trough drawdown of an equity curve, as a positive
/// fraction of the peak. 0.0 for monotone or empty curves.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for &mark in equity {
        if !mark.is_finite() {
            continue;
        }
        if mark > peak {
            peak = mark;
        }
        if peak > 0.0 {
            worst = worst.max(1.0 - mark / peak);
        }
    }
    worst
}

/// One pair's outcome over one testing window. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowResult {
    pub pair: Pair,
    pub window_id: usize,
    pub trades: Vec<ClosedTrade>,
    pub sharpe: f64,
    pub cumulative_return: f64,
    pub max_drawdown: f64,
    /// Monetary PnL against the per-pair capital allocation.
    pub net_pnl: Decimal,
}

impl WindowResult {
    /// Build a result from a simulated equity curve.
    pub fn from_equity(
        pair: Pair,
        window_id: usize,
        trades: Vec<ClosedTrade>,
        equity: &[f64],
        final_capital: f64,
        allocated_capital: Decimal,
    ) -> Self {
        let returns = returns_from_equity(equity);
        let cumulative_return = final_capital - 1.0;
        let net_pnl = allocated_capital
            * Decimal::from_f64(cumulative_return).unwrap_or(Decimal::ZERO);
        Self {
            pair,
            window_id,
            trades,
            sharpe: sharpe_ratio(&returns),
            cumulative_return,
            max_drawdown: max_drawdown(equity),
            net_pnl: net_pnl.round_dp(2),
        }
    }
}

/// Cross-window pair ranking: persistence blended with walk-forward
/// Sharpe. The Sharpe leg is squashed through tanh so one lucky window
/// cannot dominate the persistence evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairRanking {
    pub pair: Pair,
    pub windows_traded: usize,
    pub mean_sharpe: f64,
    pub persistence_rate: f64,
    pub composite_score: f64,
}

/// Append-only collector of window results.
#[derive(Debug, Default)]
pub struct PerformanceAggregator {
    results: Vec<WindowResult>,
}

impl PerformanceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, result: WindowResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[WindowResult] {
        &self.results
    }

    /// Rank traded pairs by composite score, best first.
    pub fn rankings(&self, tracker: &PersistenceTracker) -> Vec<PairRanking> {
        let mut by_pair: BTreeMap<(String, String), (Pair, Vec<f64>)> = BTreeMap::new();
        for result in &self.results {
            by_pair
                .entry((result.pair.a.clone(), result.pair.b.clone()))
                .or_insert_with(|| (result.pair.clone(), Vec::new()))
                .1
                .push(result.sharpe);
        }

        let mut rankings: Vec<PairRanking> = by_pair
            .into_values()
            .map(|(pair, sharpes)| {
                let mean_sharpe = sharpes.iter().sum::<f64>() / sharpes.len() as f64;
                let persistence_rate = tracker.rate(&pair);
                let composite_score =
                    0.5 * persistence_rate + 0.5 * mean_sharpe.tanh();
                PairRanking {
                    pair,
                    windows_traded: sharpes.len(),
                    mean_sharpe,
                    persistence_rate,
                    composite_score,
                }
            })
            .collect();

        rankings.sort_by(|x, y| {
            y.composite_score
                .partial_cmp(&x.composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (&x.pair.a, &x.pair.b).cmp(&(&y.pair.a, &y.pair.b)))
        });
        rankings
    }

    pub fn into_results(self) -> Vec<WindowResult> {
        self.results
    }
}

/// Full output of one walk-forward run, ready for JSON serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub config: BacktestConfig,
    pub windows: Vec<WindowSpec>,
    pub results: Vec<WindowResult>,
    pub persistence: Vec<PersistenceRecord>,
    pub rankings: Vec<PairRanking>,
}
