//! Signal generator trait definitions.

use crate::error::StrategyError;
use crate::traits::MarketDataProvider;
use crate::types::{Event, MarketUpdate, PortfolioSnapshot, Timeframe};

/// Configuration trait for signal generators.
pub trait GeneratorConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// Read-only view handed to a generator for one invocation.
pub struct SignalContext<'a> {
    pub market_data: &'a dyn MarketDataProvider,
    pub portfolio: &'a PortfolioSnapshot,
}

/// Core signal generator trait.
///
/// A generator is a state machine over its symbols on one timeframe. It
/// must take "now" from the update's timestamp, never from the wall clock.
pub trait SignalGenerator: Send {
    /// Get the unique name of this generator.
    fn name(&self) -> &str;

    /// Evaluate a market update and return at most one outbound event.
    ///
    /// # Returns
    /// * `Ok(Some(Event::EntrySignal(..)))` to open a position
    /// * `Ok(Some(Event::PositionUpdate(..)))` to move a stop/target
    /// * `Ok(None)` if no action is needed
    /// * `Err(..)` if the cycle cannot be evaluated (e.g. missing data)
    fn on_market_update(
        &mut self,
        update: &MarketUpdate,
        ctx: &SignalContext<'_>,
    ) -> Result<Option<Event>, StrategyError>;

    /// Get the symbols this generator trades.
    fn symbols(&self) -> &[String];

    /// Get the bar timeframe this generator runs on.
    fn timeframe(&self) -> Timeframe;

    /// Whether `update` is addressed to this generator.
    fn handles(&self, update: &MarketUpdate) -> bool {
        update.timeframe == self.timeframe() && self.symbols().iter().any(|s| *s == update.symbol)
    }

    /// Get a description of the generator.
    fn description(&self) -> &str {
        ""
    }
}
