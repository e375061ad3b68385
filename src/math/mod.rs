//! Numerical routines for the cointegration pipeline.
//!
//! OLS and the unit-root test are pure functions of their input series;
//! given identical inputs they always produce identical outputs.

pub mod adf;
pub mod half_life;
pub mod ols;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MathError {
    #[error("too few observations: need at least {needed}, got {actual}")]
    TooFewObservations { needed: usize, actual: usize },

    #[error("degenerate regression: {0}")]
    Singular(String),
}

pub use adf::{dickey_fuller, UnitRootTest};
pub use half_life::estimate_half_life;
pub use ols::{fit as ols_fit, OlsFit};
