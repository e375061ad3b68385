//! Pair discovery: cointegration testing and spread construction.
//!
//! Candidate pairs are sector-mates from the market snapshot. For each
//! training window the tester estimates a hedge ratio by OLS and checks
//! the residual spread for stationarity (Engle-Granger two-step). The
//! spread model then converts admitted relationships into a normalized
//! z-score series with no look-ahead.

pub mod cointegration;
pub mod config;
pub mod error;
pub mod spread;

pub use cointegration::{CointegrationResult, CointegrationTester, Pair};
pub use config::BacktestConfig;
pub use error::PairError;
pub use spread::{SpreadModel, SpreadSnapshot};
