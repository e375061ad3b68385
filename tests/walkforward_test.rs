//! End-to-end walk-forward run over a small synthetic universe.

use chrono::NaiveDate;
use statwalk::data::{MarketSnapshot, PriceSeries};
use statwalk::discovery::BacktestConfig;
use statwalk::walkforward::WalkForwardOrchestrator;

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

fn daily_dates(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n).map(|i| start + chrono::Days::new(i as u64)).collect()
}

/// Universe: KO and PEP cointegrated (mean-reverting spread with
/// lambda = -0.3), XOM and CVX independent random walks, plus a calm
/// volatility index with one stressed stretch.
fn synthetic_snapshot(n: usize) -> MarketSnapshot {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let dates = daily_dates(start, n);

    let mut walk = lcg(7);
    let mut shock = lcg(19);
    let mut ko = Vec::with_capacity(n);
    let mut pep = Vec::with_capacity(n);
    let mut level = 100.0;
    let mut noise = 0.0;
    for _ in 0..n {
        level += walk();
        noise = 0.7 * noise + shock();
        ko.push(level);
        pep.push(2.0 * level + 30.0 + noise);
    }

    let mut walk_x = lcg(31);
    let mut walk_c = lcg(43);
    let mut xom = Vec::with_capacity(n);
    let mut cvx = Vec::with_capacity(n);
    let (mut lx, mut lc) = (90.0, 110.0);
    for _ in 0..n {
        lx += walk_x();
        lc += walk_c();
        xom.push(lx);
        cvx.push(lc);
    }

    // Calm index with a crisis stretch in the middle of the history.
    let vix: Vec<f64> = (0..n)
        .map(|i| if (n / 2..n / 2 + 60).contains(&i) { 32.0 } else { 15.0 })
        .collect();

    let series = vec![
        PriceSeries::new("KO".to_string(), dates.clone(), ko).unwrap(),
        PriceSeries::new("PEP".to_string(), dates.clone(), pep).unwrap(),
        PriceSeries::new("XOM".to_string(), dates.clone(), xom).unwrap(),
        PriceSeries::new("CVX".to_string(), dates.clone(), cvx).unwrap(),
    ];
    let vix_series = PriceSeries::new("VIX".to_string(), dates, vix).unwrap();
    MarketSnapshot::build(series, vix_series).unwrap()
}

/// Same universe plus a Retail pair with constant prices: a degenerate
/// regression input in every window.
fn snapshot_with_constant_pair(n: usize) -> MarketSnapshot {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let dates = daily_dates(start, n);
    let base = synthetic_snapshot(n);

    let mut series: Vec<PriceSeries> = base
        .closes
        .iter()
        .map(|(symbol, closes)| {
            PriceSeries::new(symbol.clone(), dates.clone(), closes.clone()).unwrap()
        })
        .collect();
    series.push(PriceSeries::new("WMT".to_string(), dates.clone(), vec![60.0; n]).unwrap());
    series.push(PriceSeries::new("TGT".to_string(), dates.clone(), vec![95.0; n]).unwrap());

    let vix = PriceSeries::new("VIX".to_string(), dates, base.vix.clone()).unwrap();
    MarketSnapshot::build(series, vix).unwrap()
}

fn fast_config() -> BacktestConfig {
    BacktestConfig {
        training_months: 12,
        testing_months: 3,
        step_months: 3,
        min_training_observations: 200,
        ..Default::default()
    }
}

#[test]
fn full_run_produces_windows_and_trades() {
    // 30 months of daily history with 12/3/3: six windows.
    let snapshot = synthetic_snapshot(913);
    let config = fast_config();
    let report = WalkForwardOrchestrator::new(&snapshot, &config)
        .run()
        .unwrap();

    assert_eq!(report.windows.len(), 6);
    assert!(!report.results.is_empty());

    let total_trades: usize = report.results.iter().map(|r| r.trades.len()).sum();
    assert!(total_trades > 0, "cointegrated pair should trade");

    // Every trade stays inside its window's testing interval.
    for result in &report.results {
        let window = report.windows[result.window_id];
        for trade in &result.trades {
            assert!(trade.entry_date >= window.test_start);
            assert!(trade.exit_date < window.test_end);
            assert!(trade.entry_date <= trade.exit_date);
        }
    }
}

#[test]
fn cointegrated_pair_persists_across_windows() {
    let snapshot = synthetic_snapshot(913);
    let config = fast_config();
    let report = WalkForwardOrchestrator::new(&snapshot, &config)
        .run()
        .unwrap();

    let ko_pep = report
        .persistence
        .iter()
        .find(|r| r.pair.a == "KO" && r.pair.b == "PEP")
        .expect("KO-PEP should have persistence history");
    assert_eq!(ko_pep.windows_total, 6);
    assert!(
        ko_pep.persistence_rate() > 0.6,
        "strongly cointegrated pair should persist, rate = {}",
        ko_pep.persistence_rate()
    );
}

#[test]
fn rankings_prefer_the_cointegrated_pair() {
    let snapshot = synthetic_snapshot(913);
    let config = fast_config();
    let report = WalkForwardOrchestrator::new(&snapshot, &config)
        .run()
        .unwrap();

    assert!(!report.rankings.is_empty());
    let top = &report.rankings[0];
    assert_eq!((top.pair.a.as_str(), top.pair.b.as_str()), ("KO", "PEP"));
    // Scores are sorted best first.
    for pair in report.rankings.windows(2) {
        assert!(pair[0].composite_score >= pair[1].composite_score);
    }
}

#[test]
fn degenerate_pair_is_skipped_without_aborting() {
    // Constant prices make WMT-TGT a singular regression in every
    // window: the pair is logged and skipped, the run still completes
    // and healthy pairs are unaffected.
    let snapshot = snapshot_with_constant_pair(913);
    let config = fast_config();
    let report = WalkForwardOrchestrator::new(&snapshot, &config)
        .run()
        .unwrap();

    assert_eq!(report.windows.len(), 6);
    assert!(report
        .persistence
        .iter()
        .all(|r| r.pair.a != "TGT" && r.pair.b != "WMT"));
    assert!(report
        .results
        .iter()
        .all(|r| r.pair.a != "TGT" && r.pair.b != "WMT"));

    let ko_pep = report
        .persistence
        .iter()
        .find(|r| r.pair.a == "KO" && r.pair.b == "PEP")
        .expect("healthy pair still tracked");
    assert_eq!(ko_pep.windows_total, 6);
    let total_trades: usize = report.results.iter().map(|r| r.trades.len()).sum();
    assert!(total_trades > 0, "healthy pair should still trade");
}

#[test]
fn report_round_trips_through_json() {
    let snapshot = synthetic_snapshot(913);
    let config = fast_config();
    let report = WalkForwardOrchestrator::new(&snapshot, &config)
        .run()
        .unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let parsed: statwalk::walkforward::WalkForwardReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.windows.len(), report.windows.len());
    assert_eq!(parsed.results.len(), report.results.len());
}

#[test]
fn run_is_deterministic() {
    let snapshot = synthetic_snapshot(913);
    let config = fast_config();
    let first = WalkForwardOrchestrator::new(&snapshot, &config)
        .run()
        .unwrap();
    let second = WalkForwardOrchestrator::new(&snapshot, &config)
        .run()
        .unwrap();

    assert_eq!(first.results.len(), second.results.len());
    for (x, y) in first.results.iter().zip(second.results.iter()) {
        assert_eq!(x.pair, y.pair);
        assert_eq!(x.window_id, y.window_id);
        assert_eq!(x.sharpe, y.sharpe);
        assert_eq!(x.net_pnl, y.net_pnl);
    }
}
