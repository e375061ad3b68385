//! Property tests for the sizing and statistics layers.

use chrono::NaiveDate;
use proptest::prelude::*;
use statwalk::discovery::{BacktestConfig, SpreadModel};
use statwalk::trading::{kelly_fraction, PositionSizer, Regime};
use statwalk::walkforward::{generate_windows, max_drawdown, sharpe_ratio};

proptest! {
    #[test]
    fn half_kelly_fraction_stays_in_half_unit_interval(
        win_prob in 0.0f64..=1.0,
        payoff_ratio in 0.01f64..10.0,
    ) {
        let sizer = PositionSizer::new(0.60, 0.5);
        let fraction = sizer
            .size(1, Regime::Normal, 0.5, win_prob, payoff_ratio)
            .unwrap();
        prop_assert!((0.0..=0.5).contains(&fraction));
    }

    #[test]
    fn kelly_fraction_is_clamped(
        win_prob in 0.0f64..=1.0,
        payoff_ratio in 0.01f64..10.0,
    ) {
        let kelly = kelly_fraction(win_prob, payoff_ratio).unwrap();
        prop_assert!((0.0..=1.0).contains(&kelly));
    }

    #[test]
    fn crisis_multiplier_never_exceeds_boost(
        win_prob in 0.0f64..=1.0,
        payoff_ratio in 0.01f64..10.0,
        persistence_rate in 0.0f64..=1.0,
    ) {
        let sizer = PositionSizer::new(0.60, 0.5);
        let fraction = sizer
            .size(1, Regime::Crisis, persistence_rate, win_prob, payoff_ratio)
            .unwrap();
        // Half-Kelly cap of 0.5, boosted at most 1.5x.
        prop_assert!((0.0..=0.75).contains(&fraction));
    }

    #[test]
    fn sharpe_is_finite_for_any_returns(
        returns in prop::collection::vec(-0.2f64..0.2, 0..120),
    ) {
        prop_assert!(sharpe_ratio(&returns).is_finite());
    }

    #[test]
    fn max_drawdown_is_a_fraction(
        equity in prop::collection::vec(0.1f64..10.0, 0..120),
    ) {
        let dd = max_drawdown(&equity);
        prop_assert!((0.0..=1.0).contains(&dd));
    }

    #[test]
    fn z_scores_are_finite_after_warmup(
        closes_a in prop::collection::vec(10.0f64..500.0, 40..80),
        hedge_ratio in -3.0f64..3.0,
    ) {
        let n = closes_a.len();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates: Vec<NaiveDate> =
            (0..n).map(|i| start + chrono::Days::new(i as u64)).collect();
        let closes_b = vec![50.0; n];

        let window = 20;
        let model = SpreadModel::new(window);
        let snapshots = model.build(&dates, &closes_a, &closes_b, hedge_ratio, 0.0);

        for snap in &snapshots[..window - 1] {
            prop_assert!(snap.z_score.is_none());
        }
        for snap in &snapshots {
            if let Some(z) = snap.z_score {
                prop_assert!(z.is_finite());
            }
        }
    }

    #[test]
    fn windows_never_overlap_within_themselves(
        training in 6u32..36,
        testing in 1u32..12,
        step in 1u32..12,
        span_days in 400u64..4000,
    ) {
        let config = BacktestConfig {
            training_months: training,
            testing_months: testing,
            step_months: step,
            ..Default::default()
        };
        let first = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let last = first + chrono::Days::new(span_days);

        if let Ok(windows) = generate_windows(first, last, &config) {
            for w in &windows {
                prop_assert!(w.train_start < w.train_end);
                prop_assert_eq!(w.train_end, w.test_start);
                prop_assert!(w.test_start < w.test_end);
                prop_assert!(w.test_end <= last + chrono::Days::new(1));
            }
            for pair in windows.windows(2) {
                prop_assert!(pair[1].train_start > pair[0].train_start);
            }
        }
    }
}
