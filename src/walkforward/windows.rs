//! Rolling (training, testing) window generation.
//!
//! Windows are defined on calendar months and slide forward by a fixed
//! step. Intervals are half-open `[start, end)`: a window's testing
//! interval begins exactly where its training interval ends, so the two
//! never overlap and the testing slice is strictly out-of-sample.

use super::BacktestError;
use crate::discovery::BacktestConfig;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One walk-forward window. All bounds are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub id: usize,
    pub train_start: NaiveDate,
    pub train_end: NaiveDate,
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
}

/// Generate windows covering `[first, last]` calendar history.
///
/// Each window trains on `training_months` and tests on the following
/// `testing_months`; consecutive windows start `step_months` apart. The
/// last window is the one whose testing interval still fits within the
/// available history. Fails when not even one window fits.
pub fn generate_windows(
    first: NaiveDate,
    last: NaiveDate,
    config: &BacktestConfig,
) -> Result<Vec<WindowSpec>, BacktestError> {
    let training = Months::new(config.training_months);
    let testing = Months::new(config.testing_months);
    let step = Months::new(config.step_months);

    let mut windows = Vec::new();
    let mut train_start = first;

    loop {
        let train_end = train_start + training;
        let test_end = train_end + testing;
        // The testing interval is half-open, so `test_end - 1 day` is the
        // last date it may contain.
        if test_end > last + chrono::Days::new(1) {
            break;
        }
        windows.push(WindowSpec {
            id: windows.len(),
            train_start,
            train_end,
            test_start: train_end,
            test_end,
        });
        train_start = train_start + step;
    }

    if windows.is_empty() {
        return Err(BacktestError::InsufficientHistory {
            first,
            last,
            needed_months: config.training_months + config.testing_months,
        });
    }

    info!(
        windows = windows.len(),
        first_test = %windows[0].test_start,
        last_test = %windows[windows.len() - 1].test_end,
        "Walk-forward windows generated"
    );
    Ok(windows)
}
