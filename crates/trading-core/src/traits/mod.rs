//! Core traits for the trading system.

mod broker;
mod data_source;
mod notifier;
mod risk;
mod sink;
mod strategy;

pub use broker::{OrderExecutor, PortfolioSource};
pub use data_source::MarketDataProvider;
pub use notifier::Notifier;
pub use risk::{PositionSizing, RiskValidation, RiskVerdict};
pub use sink::{EventSink, TickListener};
pub use strategy::{GeneratorConfig, SignalContext, SignalGenerator};
