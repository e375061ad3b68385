//! Cross-window cointegration persistence tracking.
//!
//! Records, per pair, how many windows it has been tested in and how many
//! of those found it cointegrated. The resulting rate gates trading
//! eligibility: a pair with enough history must keep its rate above the
//! configured floor, re-evaluated fresh every window. Eligibility is
//! always queried against prior windows only; all of a window's records
//! are applied before the next window asks.

use crate::discovery::Pair;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Per-pair persistence counts. Counts only grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceRecord {
    pub pair: Pair,
    pub windows_cointegrated: u32,
    pub windows_total: u32,
}

impl PersistenceRecord {
    pub fn persistence_rate(&self) -> f64 {
        if self.windows_total == 0 {
            return 0.0;
        }
        f64::from(self.windows_cointegrated) / f64::from(self.windows_total)
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceTracker {
    records: HashMap<Pair, PersistenceRecord>,
    /// Windows of history before the rate gate applies.
    min_windows: u32,
    /// Rate a pair must exceed once gated.
    min_rate: f64,
}

impl PersistenceTracker {
    pub fn new(min_windows: u32, min_rate: f64) -> Self {
        Self {
            records: HashMap::new(),
            min_windows,
            min_rate,
        }
    }

    /// Record one window's cointegration outcome for a pair.
    pub fn record(&mut self, pair: &Pair, window_id: usize, is_cointegrated: bool) {
        let record = self
            .records
            .entry(pair.clone())
            .or_insert_with(|| PersistenceRecord {
                pair: pair.clone(),
                windows_cointegrated: 0,
                windows_total: 0,
            });
        record.windows_total += 1;
        if is_cointegrated {
            record.windows_cointegrated += 1;
        }
        debug!(
            pair = %pair,
            window_id,
            is_cointegrated,
            rate = format!("{:.2}", record.persistence_rate()),
            "Persistence recorded"
        );
    }

    /// Trading eligibility under the ramp-up rule: ungated until the pair
    /// has `min_windows` of history, then the rate must exceed `min_rate`.
    /// Re-evaluated from scratch each time; eligibility lost in one window
    /// can be regained later.
    pub fn eligible(&self, pair: &Pair) -> bool {
        match self.records.get(pair) {
            None => true,
            Some(record) if record.windows_total < self.min_windows => true,
            Some(record) => record.persistence_rate() > self.min_rate,
        }
    }

    /// Observed persistence rate; a pair with no history reads as 0.0,
    /// which keeps unproven pairs on the conservative crisis multiplier.
    pub fn rate(&self, pair: &Pair) -> f64 {
        self.records
            .get(pair)
            .map(PersistenceRecord::persistence_rate)
            .unwrap_or(0.0)
    }

    /// All records in deterministic (pair-sorted) order.
    pub fn records(&self) -> Vec<PersistenceRecord> {
        let mut records: Vec<PersistenceRecord> = self.records.values().cloned().collect();
        records.sort_by(|x, y| (&x.pair.a, &x.pair.b).cmp(&(&y.pair.a, &y.pair.b)));
        records
    }
}
