//! Position sizing and risk validation.
//!
//! Provides the position sizer and the maximum-leverage risk manager used
//! by the trading director.

mod position_sizer;
mod risk_manager;

#[cfg(test)]
mod testing;

pub use position_sizer::{PositionSizer, PositionSizingMethod};
pub use risk_manager::{RiskConfig, RiskManager};
