//! Signal generators for the trading director.
//!
//! This crate provides:
//! - Moving Average Crossover
//! - RSI mean reversion
//! - Range breakout with trailing-stop management
//! - The shared daily entry gate and trailing-stop rule
//! - A registry building generators from tagged settings

mod gate;
mod indicators;
mod ma_crossover;
mod range_breakout;
mod registry;
mod rsi_strategy;
mod trailing_stop;
mod window;

#[cfg(test)]
mod testing;

pub use gate::DailyEntryGate;
pub use ma_crossover::{MACrossoverConfig, MACrossoverStrategy};
pub use range_breakout::{RangeBreakoutConfig, RangeBreakoutStrategy};
pub use registry::{GeneratorSettings, StrategyInfo, StrategyRegistry};
pub use rsi_strategy::{RsiConfig, RsiStrategy};
pub use trailing_stop::trailing_stop;
pub use window::TimeWindow;
