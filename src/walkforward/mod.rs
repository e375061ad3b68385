//! Walk-forward orchestration.
//!
//! Rolls (training, testing) windows forward in time. Per window: test
//! every sector-mate pair for cointegration on the training slice, filter
//! by p-value, half-life and persistence eligibility, then simulate the
//! admitted pairs on the testing slice and collect results. Pairs within
//! a window are independent and evaluated in parallel; persistence and
//! trade statistics feed forward between windows only, never between
//! sibling pairs, so all of a window's updates are merged sequentially
//! after the parallel phase.

pub mod performance;
pub mod persistence;
pub mod windows;

use crate::data::{same_sector, sector_of, MarketSnapshot};
use crate::discovery::{BacktestConfig, CointegrationTester, Pair, SpreadModel};
use crate::math::estimate_half_life;
use crate::trading::{regimes_for, PairTradeStats, PositionSizer, SignalEngine, SimulationInput};
use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use performance::{
    max_drawdown, returns_from_equity, sharpe_ratio, PairRanking, PerformanceAggregator,
    WalkForwardReport, WindowResult,
};
pub use persistence::{PersistenceRecord, PersistenceTracker};
pub use windows::{generate_windows, WindowSpec};

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "history {first}..{last} is shorter than one training+testing interval ({needed_months} months)"
    )]
    InsufficientHistory {
        first: NaiveDate,
        last: NaiveDate,
        needed_months: u32,
    },
}

/// All unordered sector-mate pairs in the snapshot, in deterministic
/// order. Unknown-sector symbols never pair with anything.
pub fn candidate_pairs(snapshot: &MarketSnapshot) -> Vec<Pair> {
    let symbols = snapshot.symbols();
    let mut pairs = Vec::new();
    for (i, x) in symbols.iter().enumerate() {
        for y in &symbols[i + 1..] {
            if same_sector(x, y) {
                pairs.push(Pair::new(x, y, sector_of(x)));
            }
        }
    }
    pairs
}

/// Per-pair outcome of one window's parallel phase, merged sequentially.
struct PairOutcome {
    pair: Pair,
    /// None when the pair was skipped (data/regression error) and must
    /// not count toward persistence history.
    cointegrated: Option<bool>,
    result: Option<WindowResult>,
}

pub struct WalkForwardOrchestrator<'a> {
    snapshot: &'a MarketSnapshot,
    config: &'a BacktestConfig,
}

impl<'a> WalkForwardOrchestrator<'a> {
    pub fn new(snapshot: &'a MarketSnapshot, config: &'a BacktestConfig) -> Self {
        Self { snapshot, config }
    }

    /// Run the full walk-forward evaluation.
    pub fn run(&self) -> Result<WalkForwardReport, BacktestError> {
        self.config
            .validate()
            .map_err(BacktestError::InvalidConfig)?;

        let windows = generate_windows(
            self.snapshot.first_date(),
            self.snapshot.last_date(),
            self.config,
        )?;
        let pairs = candidate_pairs(self.snapshot);
        if pairs.is_empty() {
            warn!("No sector-mate pairs in the universe");
        }

        let tester = CointegrationTester::new(self.config.min_training_observations);
        let spread_model = SpreadModel::new(self.config.rolling_window);
        let engine = SignalEngine::new(
            self.config.entry_threshold,
            self.config.exit_threshold,
            self.config.stop_loss_threshold,
            self.config.cost_bps.to_f64().unwrap_or(0.0) / 10_000.0,
        );
        let sizer = PositionSizer::new(
            self.config.persistence_min_rate,
            self.config.kelly_fraction_multiplier,
        );

        let mut tracker = PersistenceTracker::new(
            self.config.persistence_min_windows,
            self.config.persistence_min_rate,
        );
        let mut stats: HashMap<Pair, PairTradeStats> = HashMap::new();
        let mut aggregator = PerformanceAggregator::new();

        for window in &windows {
            let train_range = self
                .snapshot
                .index_range(window.train_start, window.train_end);
            let test_range = self.snapshot.index_range(window.test_start, window.test_end);
            if train_range.is_empty() || test_range.is_empty() {
                warn!(window_id = window.id, "Window has no calendar dates, skipping");
                continue;
            }

            let regimes = regimes_for(
                &self.snapshot.vix[test_range.clone()],
                self.config.vix_crisis_threshold,
            );

            // Parallel phase: pairs are independent given the finalized
            // state from prior windows. Tracker and stats are read-only
            // here; mutation happens in the merge below.
            let outcomes: Vec<PairOutcome> = pairs
                .par_iter()
                .map(|pair| {
                    self.evaluate_pair(
                        pair,
                        window,
                        &train_range,
                        &test_range,
                        &regimes,
                        &tester,
                        &spread_model,
                        &engine,
                        &sizer,
                        &tracker,
                        &stats,
                    )
                })
                .collect();

            // Sequential merge: all persistence updates for this window
            // land before the next window queries eligibility.
            let mut tested = 0usize;
            let mut admitted = 0usize;
            let mut traded = 0usize;
            for outcome in outcomes {
                if let Some(is_cointegrated) = outcome.cointegrated {
                    tested += 1;
                    if is_cointegrated {
                        admitted += 1;
                    }
                    tracker.record(&outcome.pair, window.id, is_cointegrated);
                }
                if let Some(result) = outcome.result {
                    traded += 1;
                    let pair_stats = stats.entry(result.pair.clone()).or_default();
                    for trade in &result.trades {
                        pair_stats.record(trade.net_return);
                    }
                    aggregator.append(result);
                }
            }
            info!(
                window_id = window.id,
                test_start = %window.test_start,
                tested,
                admitted,
                traded,
                "Window complete"
            );
        }

        let persistence = tracker.records();
        let rankings = aggregator.rankings(&tracker);
        Ok(WalkForwardReport {
            config: self.config.clone(),
            windows,
            results: aggregator.into_results(),
            persistence,
            rankings,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate_pair(
        &self,
        pair: &Pair,
        window: &WindowSpec,
        train_range: &std::ops::Range<usize>,
        test_range: &std::ops::Range<usize>,
        regimes: &[crate::trading::Regime],
        tester: &CointegrationTester,
        spread_model: &SpreadModel,
        engine: &SignalEngine,
        sizer: &PositionSizer,
        tracker: &PersistenceTracker,
        stats: &HashMap<Pair, PairTradeStats>,
    ) -> PairOutcome {
        let skipped = |pair: &Pair| PairOutcome {
            pair: pair.clone(),
            cointegrated: None,
            result: None,
        };
        let (Some(closes_a), Some(closes_b)) = (
            self.snapshot.closes.get(&pair.a),
            self.snapshot.closes.get(&pair.b),
        ) else {
            return skipped(pair);
        };

        let cointegration = match tester.test(
            pair,
            &closes_a[train_range.clone()],
            &closes_b[train_range.clone()],
            window.id,
        ) {
            Ok(result) => result,
            Err(error) => {
                debug!(pair = %pair, window_id = window.id, %error, "Pair skipped");
                return skipped(pair);
            }
        };

        let is_cointegrated = cointegration.is_cointegrated(self.config.cointegration_p_threshold);
        let not_traded = |cointegrated: bool| PairOutcome {
            pair: pair.clone(),
            cointegrated: Some(cointegrated),
            result: None,
        };
        if !is_cointegrated {
            return not_traded(false);
        }

        // Half-life filter on the training spread.
        let train_spread: Vec<f64> = train_range
            .clone()
            .filter_map(|i| {
                let (a, b) = (closes_a[i], closes_b[i]);
                (a.is_finite() && b.is_finite())
                    .then(|| a - cointegration.hedge_ratio * b - cointegration.intercept)
            })
            .collect();
        let half_life = estimate_half_life(&train_spread);
        if half_life >= self.config.half_life_max_days {
            debug!(
                pair = %pair,
                window_id = window.id,
                half_life = format!("{:.1}", half_life),
                "Half-life filter failed"
            );
            return not_traded(true);
        }

        // Eligibility against prior windows only.
        if !tracker.eligible(pair) {
            debug!(pair = %pair, window_id = window.id, "Persistence gate failed");
            return not_traded(true);
        }

        let (win_prob, payoff_ratio) = match stats.get(pair) {
            Some(s) => (
                s.win_prob_or(self.config.prior_win_prob, self.config.min_trades_for_stats),
                s.payoff_ratio_or(
                    self.config.prior_payoff_ratio,
                    self.config.min_trades_for_stats,
                ),
            ),
            None => (self.config.prior_win_prob, self.config.prior_payoff_ratio),
        };
        let pair_sizer = match sizer.for_pair(tracker.rate(pair), win_prob, payoff_ratio) {
            Ok(s) => s,
            Err(error) => {
                warn!(pair = %pair, window_id = window.id, %error, "Sizing rejected pair");
                return not_traded(true);
            }
        };

        // Build the spread over training + testing so the rolling window
        // is already warm at the first testing date, then simulate on the
        // testing slice alone.
        let full_range = train_range.start..test_range.end;
        let snapshots = spread_model.build(
            &self.snapshot.calendar[full_range.clone()],
            &closes_a[full_range.clone()],
            &closes_b[full_range],
            cointegration.hedge_ratio,
            cointegration.intercept,
        );
        let test_offset = test_range.start - train_range.start;

        let input = SimulationInput {
            dates: &self.snapshot.calendar[test_range.clone()],
            snapshots: &snapshots[test_offset..],
            closes_a: &closes_a[test_range.clone()],
            closes_b: &closes_b[test_range.clone()],
            regimes,
        };
        let outcome = engine.simulate(&input, &pair_sizer);

        let result = WindowResult::from_equity(
            pair.clone(),
            window.id,
            outcome.trades,
            &outcome.equity,
            outcome.final_capital,
            self.config.initial_capital,
        );
        PairOutcome {
            pair: pair.clone(),
            cointegrated: Some(true),
            result: Some(result),
        }
    }
}
