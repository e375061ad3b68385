//! Signal generation and position sizing for the testing slice of a
//! walk-forward window.

pub mod regime;
pub mod signal;
pub mod sizing;

pub use regime::{classify_regime, regimes_for, Regime};
pub use signal::{
    ClosedTrade, ExitReason, PositionState, SignalEngine, SimulationInput, SimulationOutcome,
};
pub use sizing::{kelly_fraction, PairSizer, PairTradeStats, PositionSizer, SizingError};
