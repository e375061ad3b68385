//! Trading state machine over a z-score sequence.
//!
//! States: FLAT, LONG_SPREAD (long A / short B), SHORT_SPREAD (short A /
//! long B). Transitions are evaluated once per date in time order using
//! the same-date z-score; the stop-loss check takes priority over the
//! mean-reversion exit, and a close never re-enters on the same date. A
//! missing z-score (warmup or missing price) holds the current position.
//!
//! Every transition into FLAT appends a closed trade. Whatever is still
//! open at the end of the testing window is force-liquidated and recorded
//! with exit reason `WindowEnd`.

use super::regime::Regime;
use super::sizing::PairSizer;
use crate::discovery::SpreadSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    LongSpread,
    ShortSpread,
}

impl PositionState {
    pub fn direction(self) -> i8 {
        match self {
            PositionState::Flat => 0,
            PositionState::LongSpread => 1,
            PositionState::ShortSpread => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    MeanReversion,
    StopLoss,
    WindowEnd,
}

/// One completed round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    /// +1 long spread, -1 short spread.
    pub direction: i8,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_z: f64,
    /// NaN when the window closed without a same-date z-score.
    pub exit_z: f64,
    pub holding_days: usize,
    /// Unsigned capital fraction deployed.
    pub position_fraction: f64,
    /// Spread return before costs, signed by outcome.
    pub gross_return: f64,
    /// Return on capital net of the constant per-leg cost on all four legs.
    pub net_return: f64,
    pub exit_reason: ExitReason,
}

/// Mutable per-pair-per-window simulation state. Owned exclusively by one
/// `simulate` call and consumed at window end.
#[derive(Debug)]
struct TradeState {
    position: PositionState,
    entry_index: usize,
    entry_date: NaiveDate,
    entry_z: f64,
    entry_price_a: f64,
    entry_price_b: f64,
    fraction: f64,
    /// Capital at entry, before entry costs (basis for net trade return).
    capital_at_entry: f64,
    /// Realized capital as a multiple of starting capital.
    capital: f64,
    trades: Vec<ClosedTrade>,
}

impl TradeState {
    fn new(first_date: NaiveDate) -> Self {
        Self {
            position: PositionState::Flat,
            entry_index: 0,
            entry_date: first_date,
            entry_z: f64::NAN,
            entry_price_a: f64::NAN,
            entry_price_b: f64::NAN,
            fraction: 0.0,
            capital_at_entry: 1.0,
            capital: 1.0,
            trades: Vec::new(),
        }
    }
}

/// Aligned testing-slice inputs for one pair.
#[derive(Debug, Clone, Copy)]
pub struct SimulationInput<'a> {
    pub dates: &'a [NaiveDate],
    pub snapshots: &'a [SpreadSnapshot],
    pub closes_a: &'a [f64],
    pub closes_b: &'a [f64],
    pub regimes: &'a [Regime],
}

/// Result of simulating one pair over one testing window.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub trades: Vec<ClosedTrade>,
    /// Mark-to-market equity per date, as a multiple of starting capital.
    pub equity: Vec<f64>,
    /// Final capital multiple (equals the last equity mark).
    pub final_capital: f64,
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    entry_threshold: f64,
    exit_threshold: f64,
    stop_loss_threshold: f64,
    /// Transaction cost per leg per side as a capital fraction.
    cost_per_leg: f64,
}

impl SignalEngine {
    pub fn new(
        entry_threshold: f64,
        exit_threshold: f64,
        stop_loss_threshold: f64,
        cost_per_leg: f64,
    ) -> Self {
        Self {
            entry_threshold,
            exit_threshold,
            stop_loss_threshold,
            cost_per_leg,
        }
    }

    /// Run the state machine over a testing slice.
    ///
    /// `sizer` must be pre-validated for this pair; an entry is sized by
    /// the regime on the entry date and the fraction is held constant for
    /// the life of the trade.
    pub fn simulate(&self, input: &SimulationInput, sizer: &PairSizer) -> SimulationOutcome {
        let n = input.dates.len();
        if n == 0 {
            return SimulationOutcome {
                trades: Vec::new(),
                equity: Vec::new(),
                final_capital: 1.0,
            };
        }

        let mut state = TradeState::new(input.dates[0]);
        let mut equity = Vec::with_capacity(n);
        // Last observed finite prices, for marking and forced liquidation.
        let mut mark_a = f64::NAN;
        let mut mark_b = f64::NAN;

        for t in 0..n {
            if input.closes_a[t].is_finite() && input.closes_b[t].is_finite() {
                mark_a = input.closes_a[t];
                mark_b = input.closes_b[t];
            }

            match (state.position, input.snapshots[t].z_score) {
                // No z-score: warmup or missing data, hold unchanged.
                (_, None) => {}
                (PositionState::Flat, Some(z)) => {
                    // No entries on the final date: window-end liquidation
                    // would close them the same day.
                    if t + 1 < n {
                        if z <= -self.entry_threshold {
                            self.open(&mut state, input, sizer, t, z, PositionState::LongSpread);
                        } else if z >= self.entry_threshold {
                            self.open(&mut state, input, sizer, t, z, PositionState::ShortSpread);
                        }
                    }
                }
                (PositionState::LongSpread, Some(z)) => {
                    // Stop-loss outranks the mean-reversion exit.
                    if z.abs() >= self.stop_loss_threshold {
                        self.close(&mut state, input, t, z, ExitReason::StopLoss);
                    } else if z >= self.exit_threshold {
                        self.close(&mut state, input, t, z, ExitReason::MeanReversion);
                    }
                }
                (PositionState::ShortSpread, Some(z)) => {
                    if z.abs() >= self.stop_loss_threshold {
                        self.close(&mut state, input, t, z, ExitReason::StopLoss);
                    } else if z <= -self.exit_threshold {
                        self.close(&mut state, input, t, z, ExitReason::MeanReversion);
                    }
                }
            }

            // Daily mark-to-market.
            let mark = if state.position == PositionState::Flat {
                state.capital
            } else {
                state.capital * (1.0 + self.open_return(&state, mark_a, mark_b))
            };
            equity.push(mark);
        }

        // Forced liquidation at the window boundary.
        if state.position != PositionState::Flat {
            let exit_z = input.snapshots[n - 1].z_score.unwrap_or(f64::NAN);
            self.close_at(
                &mut state,
                input.dates[n - 1],
                n - 1,
                exit_z,
                mark_a,
                mark_b,
                ExitReason::WindowEnd,
            );
            if let Some(last) = equity.last_mut() {
                *last = state.capital;
            }
        }

        let final_capital = state.capital;
        SimulationOutcome {
            trades: state.trades,
            equity,
            final_capital,
        }
    }

    /// Signed spread return of the open position against given marks.
    fn open_return(&self, state: &TradeState, price_a: f64, price_b: f64) -> f64 {
        let ret_a = price_a / state.entry_price_a - 1.0;
        let ret_b = price_b / state.entry_price_b - 1.0;
        let raw = f64::from(state.position.direction()) * state.fraction * (ret_a - ret_b);
        if raw.is_finite() {
            raw
        } else {
            0.0
        }
    }

    fn open(
        &self,
        state: &mut TradeState,
        input: &SimulationInput,
        sizer: &PairSizer,
        t: usize,
        z: f64,
        position: PositionState,
    ) {
        let regime = input.regimes.get(t).copied().unwrap_or(Regime::Normal);
        let fraction = sizer.fraction(regime);
        state.position = position;
        state.entry_index = t;
        state.entry_date = input.dates[t];
        state.entry_z = z;
        state.entry_price_a = input.closes_a[t];
        state.entry_price_b = input.closes_b[t];
        state.fraction = fraction;
        state.capital_at_entry = state.capital;
        // Entry costs both legs.
        state.capital *= 1.0 - 2.0 * self.cost_per_leg * fraction;
        trace!(
            date = %input.dates[t],
            z = format!("{:.2}", z),
            fraction = format!("{:.4}", fraction),
            ?position,
            "Opened spread position"
        );
    }

    fn close(
        &self,
        state: &mut TradeState,
        input: &SimulationInput,
        t: usize,
        z: f64,
        reason: ExitReason,
    ) {
        self.close_at(
            state,
            input.dates[t],
            t,
            z,
            input.closes_a[t],
            input.closes_b[t],
            reason,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn close_at(
        &self,
        state: &mut TradeState,
        exit_date: NaiveDate,
        exit_index: usize,
        exit_z: f64,
        price_a: f64,
        price_b: f64,
        reason: ExitReason,
    ) {
        let gross = self.open_return(state, price_a, price_b);
        state.capital *= 1.0 + gross;
        // Exit costs both legs.
        state.capital *= 1.0 - 2.0 * self.cost_per_leg * state.fraction;

        let net_return = if state.capital_at_entry > 0.0 {
            state.capital / state.capital_at_entry - 1.0
        } else {
            0.0
        };

        state.trades.push(ClosedTrade {
            direction: state.position.direction(),
            entry_date: state.entry_date,
            exit_date,
            entry_z: state.entry_z,
            exit_z,
            holding_days: exit_index - state.entry_index,
            position_fraction: state.fraction,
            gross_return: gross,
            net_return,
            exit_reason: reason,
        });
        trace!(
            entry = %state.entry_date,
            exit = %exit_date,
            net_return = format!("{:.5}", net_return),
            ?reason,
            "Closed spread position"
        );

        state.position = PositionState::Flat;
        state.fraction = 0.0;
        state.entry_z = f64::NAN;
        state.entry_price_a = f64::NAN;
        state.entry_price_b = f64::NAN;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trading::sizing::PositionSizer;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        (0..n).map(|i| start + chrono::Days::new(i as u64)).collect()
    }

    fn snapshots(dates: &[NaiveDate], z_scores: &[Option<f64>]) -> Vec<SpreadSnapshot> {
        dates
            .iter()
            .zip(z_scores.iter())
            .map(|(d, z)| SpreadSnapshot {
                date: *d,
                raw_spread: z.unwrap_or(f64::NAN),
                z_score: *z,
            })
            .collect()
    }

    /// Engine with zero cost and a unit-fraction sizer for scripted tests.
    fn engine() -> SignalEngine {
        SignalEngine::new(2.0, 0.0, 4.0, 0.0)
    }

    fn unit_sizer() -> PairSizer {
        // Certain win with unit payoff: full Kelly 1.0, multiplier 1.0.
        PositionSizer::new(0.60, 1.0).for_pair(1.0, 1.0, 1.0).unwrap()
    }

    fn run_scripted(z_scores: Vec<Option<f64>>) -> SimulationOutcome {
        let n = z_scores.len();
        let dates = dates(n);
        let snaps = snapshots(&dates, &z_scores);
        let closes_a = vec![100.0; n];
        let closes_b = vec![100.0; n];
        let regimes = vec![Regime::Normal; n];
        let input = SimulationInput {
            dates: &dates,
            snapshots: &snaps,
            closes_a: &closes_a,
            closes_b: &closes_b,
            regimes: &regimes,
        };
        engine().simulate(&input, &unit_sizer())
    }

    #[test]
    fn test_scripted_long_entry_and_mean_reversion_exit() {
        // [0, -2.1, -2.5, -0.1, 0.0]: enter long at index 1, hold through
        // index 3, exit at index 4 with exactly one closed trade.
        let outcome = run_scripted(vec![
            Some(0.0),
            Some(-2.1),
            Some(-2.5),
            Some(-0.1),
            Some(0.0),
        ]);
        assert_eq!(outcome.trades.len(), 1);
        let trade = &outcome.trades[0];
        assert_eq!(trade.direction, 1);
        assert_eq!(trade.exit_reason, ExitReason::MeanReversion);
        assert_eq!(trade.entry_z, -2.1);
        assert_eq!(trade.exit_z, 0.0);
        assert_eq!(trade.holding_days, 3);
    }

    #[test]
    fn test_stop_loss_takes_priority_over_exit() {
        // Short entered at +2.2; z then spikes to +4.5, which satisfies
        // the stop-loss magnitude. It must never read as reversion.
        let outcome = run_scripted(vec![Some(0.0), Some(2.2), Some(4.5), Some(0.0)]);
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].direction, -1);
        assert_eq!(outcome.trades[0].exit_reason, ExitReason::StopLoss);
    }

    #[test]
    fn test_long_stop_loss_on_deep_divergence() {
        let outcome = run_scripted(vec![Some(-2.1), Some(-3.0), Some(-4.2), Some(0.0)]);
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].direction, 1);
        assert_eq!(outcome.trades[0].exit_reason, ExitReason::StopLoss);
    }

    #[test]
    fn test_no_reentry_on_exit_date() {
        // Exit hits at index 2 with z = +2.5, which also satisfies the
        // short entry condition; the engine must stay flat that date.
        let outcome = run_scripted(vec![
            Some(-2.1),
            Some(-1.0),
            Some(2.5),
            Some(2.6),
            Some(2.0),
        ]);
        assert_eq!(outcome.trades.len(), 2);
        assert_eq!(outcome.trades[0].exit_reason, ExitReason::MeanReversion);
        // Second entry happens on the following date.
        assert_eq!(outcome.trades[1].direction, -1);
        assert_eq!(outcome.trades[1].exit_reason, ExitReason::WindowEnd);
    }

    #[test]
    fn test_window_end_forces_liquidation() {
        let outcome = run_scripted(vec![Some(0.0), Some(-2.4), Some(-1.5), Some(-1.2)]);
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].exit_reason, ExitReason::WindowEnd);
    }

    #[test]
    fn test_missing_z_holds_position() {
        let outcome = run_scripted(vec![Some(-2.1), None, None, Some(0.1)]);
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].exit_reason, ExitReason::MeanReversion);
        assert_eq!(outcome.trades[0].holding_days, 3);
    }

    #[test]
    fn test_no_entry_on_final_date() {
        let outcome = run_scripted(vec![Some(0.0), Some(0.1), Some(-2.5)]);
        assert!(outcome.trades.is_empty());
        assert_eq!(outcome.final_capital, 1.0);
    }

    #[test]
    fn test_warmup_none_never_trades() {
        let outcome = run_scripted(vec![None, None, None, None]);
        assert!(outcome.trades.is_empty());
        assert!(outcome.equity.iter().all(|&e| (e - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_pnl_long_spread_converges() {
        // Long spread: A rises relative to B after entry.
        let n = 4;
        let dates = dates(n);
        let z = vec![Some(0.0), Some(-2.5), Some(-1.0), Some(0.5)];
        let snaps = snapshots(&dates, &z);
        let closes_a = vec![100.0, 100.0, 103.0, 106.0];
        let closes_b = vec![100.0, 100.0, 101.0, 101.0];
        let regimes = vec![Regime::Normal; n];
        let input = SimulationInput {
            dates: &dates,
            snapshots: &snaps,
            closes_a: &closes_a,
            closes_b: &closes_b,
            regimes: &regimes,
        };
        let outcome = engine().simulate(&input, &unit_sizer());

        assert_eq!(outcome.trades.len(), 1);
        let trade = &outcome.trades[0];
        // ret_a = 6%, ret_b = 1%: gross spread return = 5%.
        assert!((trade.gross_return - 0.05).abs() < 1e-9);
        assert!(trade.net_return > 0.0);
        assert!((outcome.final_capital - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_costs_reduce_net_return() {
        let n = 4;
        let dates = dates(n);
        let z = vec![Some(0.0), Some(-2.5), Some(-1.0), Some(0.5)];
        let snaps = snapshots(&dates, &z);
        let closes_a = vec![100.0; n];
        let closes_b = vec![100.0; n];
        let regimes = vec![Regime::Normal; n];
        let input = SimulationInput {
            dates: &dates,
            snapshots: &snaps,
            closes_a: &closes_a,
            closes_b: &closes_b,
            regimes: &regimes,
        };
        // 10 bps per leg per side; flat prices mean zero gross return.
        let engine = SignalEngine::new(2.0, 0.0, 4.0, 0.001);
        let outcome = engine.simulate(&input, &unit_sizer());

        assert_eq!(outcome.trades.len(), 1);
        let trade = &outcome.trades[0];
        assert!((trade.gross_return - 0.0).abs() < 1e-12);
        // Four legs at 10 bps each on a unit fraction.
        assert!((trade.net_return + 0.004).abs() < 1e-5);
    }

    #[test]
    fn test_crisis_regime_scales_entry_fraction() {
        let n = 4;
        let dates = dates(n);
        let z = vec![Some(0.0), Some(-2.5), Some(-1.0), Some(0.5)];
        let snaps = snapshots(&dates, &z);
        let closes_a = vec![100.0, 100.0, 103.0, 106.0];
        let closes_b = vec![100.0; n];
        let regimes = vec![Regime::Normal, Regime::Crisis, Regime::Normal, Regime::Normal];
        let input = SimulationInput {
            dates: &dates,
            snapshots: &snaps,
            closes_a: &closes_a,
            closes_b: &closes_b,
            regimes: &regimes,
        };
        // Persistent pair: crisis entry is boosted 1.5x.
        let sizer = PositionSizer::new(0.60, 1.0).for_pair(0.9, 1.0, 1.0).unwrap();
        let outcome = engine().simulate(&input, &sizer);
        assert_eq!(outcome.trades[0].position_fraction, 1.5);
    }
}
