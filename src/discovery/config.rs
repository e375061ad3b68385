//! Configuration for the walk-forward backtest.
//!
//! Every parameter is a named, defaulted field; configs deserialize from
//! JSON with per-field defaults so partial files are valid.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Z-score magnitude to enter a position.
    #[serde(default = "default_entry_threshold")]
    pub entry_threshold: f64,

    /// Z-score level at which a position has mean-reverted.
    #[serde(default = "default_exit_threshold")]
    pub exit_threshold: f64,

    /// Z-score magnitude that forces a stop-loss exit.
    #[serde(default = "default_stop_loss_threshold")]
    pub stop_loss_threshold: f64,

    /// Rolling lookback (observations) for spread mean/std.
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,

    /// Training interval length in calendar months.
    #[serde(default = "default_training_months")]
    pub training_months: u32,

    /// Testing interval length in calendar months.
    #[serde(default = "default_testing_months")]
    pub testing_months: u32,

    /// Forward step between consecutive windows in calendar months.
    #[serde(default = "default_step_months")]
    pub step_months: u32,

    /// p-value below which a pair counts as cointegrated.
    #[serde(default = "default_p_threshold")]
    pub cointegration_p_threshold: f64,

    /// Pairs whose training half-life is at or above this are not traded.
    #[serde(default = "default_half_life_max")]
    pub half_life_max_days: f64,

    /// Minimum training observations for the cointegration test.
    #[serde(default = "default_min_training_observations")]
    pub min_training_observations: usize,

    /// Persistence rate a pair must exceed once gating applies.
    #[serde(default = "default_persistence_min_rate")]
    pub persistence_min_rate: f64,

    /// Windows of history required before persistence gating applies.
    #[serde(default = "default_persistence_min_windows")]
    pub persistence_min_windows: u32,

    /// Volatility index level above which the regime is Crisis.
    #[serde(default = "default_vix_crisis_threshold")]
    pub vix_crisis_threshold: f64,

    /// Fraction of full Kelly to deploy (0.5 = half-Kelly).
    #[serde(default = "default_kelly_multiplier")]
    pub kelly_fraction_multiplier: f64,

    /// Prior win probability used before a pair has trade history.
    #[serde(default = "default_prior_win_prob")]
    pub prior_win_prob: f64,

    /// Prior payoff ratio used before a pair has trade history.
    #[serde(default = "default_prior_payoff_ratio")]
    pub prior_payoff_ratio: f64,

    /// Closed trades required before estimated stats replace the priors.
    #[serde(default = "default_min_trades_for_stats")]
    pub min_trades_for_stats: u32,

    /// Constant transaction cost per leg per side, in basis points.
    #[serde(default = "default_cost_bps")]
    pub cost_bps: Decimal,

    /// Capital allocated per pair per window.
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,
}

fn default_entry_threshold() -> f64 {
    2.0
}
fn default_exit_threshold() -> f64 {
    0.0
}
fn default_stop_loss_threshold() -> f64 {
    4.0
}
fn default_rolling_window() -> usize {
    20
}
fn default_training_months() -> u32 {
    24
}
fn default_testing_months() -> u32 {
    6
}
fn default_step_months() -> u32 {
    6
}
fn default_p_threshold() -> f64 {
    0.05
}
fn default_half_life_max() -> f64 {
    20.0
}
fn default_min_training_observations() -> usize {
    252
}
fn default_persistence_min_rate() -> f64 {
    0.60
}
fn default_persistence_min_windows() -> u32 {
    5
}
fn default_vix_crisis_threshold() -> f64 {
    25.0
}
fn default_kelly_multiplier() -> f64 {
    0.5
}
fn default_prior_win_prob() -> f64 {
    0.55
}
fn default_prior_payoff_ratio() -> f64 {
    1.5
}
fn default_min_trades_for_stats() -> u32 {
    5
}
fn default_cost_bps() -> Decimal {
    dec!(5)
}
fn default_initial_capital() -> Decimal {
    dec!(100_000)
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            entry_threshold: default_entry_threshold(),
            exit_threshold: default_exit_threshold(),
            stop_loss_threshold: default_stop_loss_threshold(),
            rolling_window: default_rolling_window(),
            training_months: default_training_months(),
            testing_months: default_testing_months(),
            step_months: default_step_months(),
            cointegration_p_threshold: default_p_threshold(),
            half_life_max_days: default_half_life_max(),
            min_training_observations: default_min_training_observations(),
            persistence_min_rate: default_persistence_min_rate(),
            persistence_min_windows: default_persistence_min_windows(),
            vix_crisis_threshold: default_vix_crisis_threshold(),
            kelly_fraction_multiplier: default_kelly_multiplier(),
            prior_win_prob: default_prior_win_prob(),
            prior_payoff_ratio: default_prior_payoff_ratio(),
            min_trades_for_stats: default_min_trades_for_stats(),
            cost_bps: default_cost_bps(),
            initial_capital: default_initial_capital(),
        }
    }
}

impl BacktestConfig {
    /// Validate parameter domains and cross-field ordering.
    pub fn validate(&self) -> Result<(), String> {
        if self.entry_threshold <= 0.0 {
            return Err(format!(
                "entry_threshold must be positive, got {}",
                self.entry_threshold
            ));
        }
        if self.exit_threshold < 0.0 {
            return Err(format!(
                "exit_threshold cannot be negative, got {}",
                self.exit_threshold
            ));
        }
        if self.exit_threshold >= self.entry_threshold {
            return Err(format!(
                "exit_threshold ({}) must be below entry_threshold ({})",
                self.exit_threshold, self.entry_threshold
            ));
        }
        if self.stop_loss_threshold <= self.entry_threshold {
            return Err(format!(
                "stop_loss_threshold ({}) must exceed entry_threshold ({})",
                self.stop_loss_threshold, self.entry_threshold
            ));
        }
        if self.rolling_window < 2 {
            return Err(format!(
                "rolling_window must be at least 2, got {}",
                self.rolling_window
            ));
        }
        if self.training_months == 0 || self.testing_months == 0 || self.step_months == 0 {
            return Err("window months must all be at least 1".to_string());
        }
        if !(0.0..1.0).contains(&self.cointegration_p_threshold)
            || self.cointegration_p_threshold == 0.0
        {
            return Err(format!(
                "cointegration_p_threshold must be in (0, 1), got {}",
                self.cointegration_p_threshold
            ));
        }
        if self.half_life_max_days <= 0.0 {
            return Err(format!(
                "half_life_max_days must be positive, got {}",
                self.half_life_max_days
            ));
        }
        if !(0.0..=1.0).contains(&self.persistence_min_rate) {
            return Err(format!(
                "persistence_min_rate must be in [0, 1], got {}",
                self.persistence_min_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.kelly_fraction_multiplier)
            || self.kelly_fraction_multiplier == 0.0
        {
            return Err(format!(
                "kelly_fraction_multiplier must be in (0, 1], got {}",
                self.kelly_fraction_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.prior_win_prob) {
            return Err(format!(
                "prior_win_prob must be in [0, 1], got {}",
                self.prior_win_prob
            ));
        }
        if self.prior_payoff_ratio <= 0.0 {
            return Err(format!(
                "prior_payoff_ratio must be positive, got {}",
                self.prior_payoff_ratio
            ));
        }
        if self.cost_bps < Decimal::ZERO {
            return Err("cost_bps cannot be negative".to_string());
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err("initial_capital must be positive".to_string());
        }
        Ok(())
    }
}
