//! Error types for pair-level discovery and testing.
//!
//! Both variants are recoverable at the pair level: the orchestrator logs
//! the failure and skips the pair for that window without aborting the run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PairError {
    /// Series shorter than the minimum sample for a reliable test.
    #[error("insufficient data: expected at least {expected} aligned observations, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Degenerate or perfectly collinear regression input.
    #[error("singular regression for {pair}: {reason}")]
    SingularRegression { pair: String, reason: String },
}
