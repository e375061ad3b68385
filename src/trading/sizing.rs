//! Position sizing: regime-aware capital weighting on top of a
//! half-Kelly base fraction.
//!
//! The regime table encodes the documented crisis behavior of persistent
//! pairs: relationships that survived many windows historically widen and
//! snap back harder under stress, so high-persistence pairs are sized up
//! in a crisis while low-confidence pairs are cut.

use super::regime::Regime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SizingError {
    #[error("invalid Kelly inputs: win_prob {win_prob} must be in [0, 1] and payoff_ratio {payoff_ratio} must be positive")]
    InvalidProbability { win_prob: f64, payoff_ratio: f64 },
}

/// Kelly fraction (p*b - q) / b, clamped to [0, 1].
pub fn kelly_fraction(win_prob: f64, payoff_ratio: f64) -> Result<f64, SizingError> {
    if !(0.0..=1.0).contains(&win_prob) || !win_prob.is_finite() {
        return Err(SizingError::InvalidProbability {
            win_prob,
            payoff_ratio,
        });
    }
    if payoff_ratio <= 0.0 || !payoff_ratio.is_finite() {
        return Err(SizingError::InvalidProbability {
            win_prob,
            payoff_ratio,
        });
    }
    let raw = (win_prob * payoff_ratio - (1.0 - win_prob)) / payoff_ratio;
    Ok(raw.clamp(0.0, 1.0))
}

#[derive(Debug, Clone)]
pub struct PositionSizer {
    /// Multiplier for high-persistence pairs in a crisis regime.
    crisis_boost: f64,
    /// Multiplier for low-persistence pairs in a crisis regime.
    crisis_cut: f64,
    /// Persistence rate separating the two crisis rows.
    persistence_gate: f64,
    /// Fraction of full Kelly to deploy (0.5 = half-Kelly).
    kelly_multiplier: f64,
}

impl PositionSizer {
    pub fn new(persistence_gate: f64, kelly_multiplier: f64) -> Self {
        Self {
            crisis_boost: 1.5,
            crisis_cut: 0.25,
            persistence_gate,
            kelly_multiplier,
        }
    }

    fn regime_multiplier(&self, regime: Regime, persistence_rate: f64) -> f64 {
        match regime {
            Regime::Normal => 1.0,
            Regime::Crisis if persistence_rate > self.persistence_gate => self.crisis_boost,
            Regime::Crisis => self.crisis_cut,
        }
    }

    /// Map a base direction plus regime and persistence context to a
    /// signed capital fraction.
    pub fn size(
        &self,
        base_direction: i8,
        regime: Regime,
        persistence_rate: f64,
        win_prob: f64,
        payoff_ratio: f64,
    ) -> Result<f64, SizingError> {
        let kelly = kelly_fraction(win_prob, payoff_ratio)?;
        let fraction =
            self.kelly_multiplier * kelly * self.regime_multiplier(regime, persistence_rate);
        Ok(fraction * f64::from(base_direction.signum()))
    }

    /// Validate the Kelly inputs once and bind the persistence context,
    /// leaving only the per-date regime lookup for the simulation loop.
    pub fn for_pair(
        &self,
        persistence_rate: f64,
        win_prob: f64,
        payoff_ratio: f64,
    ) -> Result<PairSizer, SizingError> {
        let kelly = kelly_fraction(win_prob, payoff_ratio)?;
        Ok(PairSizer {
            base_fraction: self.kelly_multiplier * kelly,
            normal: 1.0,
            crisis_high: self.crisis_boost,
            crisis_low: self.crisis_cut,
            persistence_gate: self.persistence_gate,
            persistence_rate,
        })
    }
}

/// Pre-validated sizer for one pair in one testing window.
#[derive(Debug, Clone)]
pub struct PairSizer {
    base_fraction: f64,
    normal: f64,
    crisis_high: f64,
    crisis_low: f64,
    persistence_gate: f64,
    persistence_rate: f64,
}

impl PairSizer {
    /// Unsigned capital fraction to deploy at an entry under `regime`.
    pub fn fraction(&self, regime: Regime) -> f64 {
        let multiplier = match regime {
            Regime::Normal => self.normal,
            Regime::Crisis if self.persistence_rate > self.persistence_gate => self.crisis_high,
            Regime::Crisis => self.crisis_low,
        };
        self.base_fraction * multiplier
    }
}

/// Running win/loss statistics for a pair's closed trades across windows.
///
/// Feeds the Kelly inputs for later windows; before `min_trades` closed
/// trades the configured priors apply, keeping the estimate out-of-sample
/// and never degenerate.
#[derive(Debug, Clone, Default)]
pub struct PairTradeStats {
    wins: u32,
    losses: u32,
    win_return_sum: f64,
    loss_return_sum: f64,
}

impl PairTradeStats {
    pub fn record(&mut self, net_return: f64) {
        if net_return > 0.0 {
            self.wins += 1;
            self.win_return_sum += net_return;
        } else {
            // Zero-return trades count as losses: they paid costs for nothing.
            self.losses += 1;
            self.loss_return_sum += net_return.abs();
        }
    }

    pub fn trades(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn win_prob_or(&self, prior: f64, min_trades: u32) -> f64 {
        if self.trades() < min_trades {
            return prior;
        }
        f64::from(self.wins) / f64::from(self.trades())
    }

    pub fn payoff_ratio_or(&self, prior: f64, min_trades: u32) -> f64 {
        if self.trades() < min_trades || self.wins == 0 || self.losses == 0 {
            return prior;
        }
        let avg_win = self.win_return_sum / f64::from(self.wins);
        let avg_loss = self.loss_return_sum / f64::from(self.losses);
        if avg_loss <= 0.0 || !(avg_win / avg_loss).is_finite() {
            return prior;
        }
        avg_win / avg_loss
    }
}
