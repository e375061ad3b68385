pub mod data;
pub mod discovery;
pub mod math;
pub mod trading;
pub mod walkforward;
