//! Moving Average Crossover generator.
//!
//! Emits a buy when the fast SMA crosses above the slow SMA on the latest
//! closed bar, and a sell when it crosses below. Positions on the other
//! side are closed before entering.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trading_core::{
    error::{DataError, StrategyError},
    traits::{GeneratorConfig, SignalContext, SignalGenerator},
    types::{EntrySignal, Event, MarketUpdate, OrderKind, Side, Timeframe},
};

use crate::gate::DailyEntryGate;
use crate::indicators::sma;

/// Configuration for the MA Crossover generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MACrossoverConfig {
    /// Symbols to trade
    pub symbols: Vec<String>,
    /// Bar timeframe
    pub timeframe: Timeframe,
    /// Fast moving average period
    pub fast_period: usize,
    /// Slow moving average period
    pub slow_period: usize,
}

impl Default for MACrossoverConfig {
    fn default() -> Self {
        Self {
            symbols: vec![],
            timeframe: Timeframe::default(),
            fast_period: 10,
            slow_period: 30,
        }
    }
}

impl GeneratorConfig for MACrossoverConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.fast_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be greater than 0".into(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be less than slow period".into(),
            ));
        }
        if self.symbols.is_empty() {
            return Err(StrategyError::InvalidConfig(
                "At least one symbol required".into(),
            ));
        }
        Ok(())
    }
}

/// Moving Average Crossover generator.
pub struct MACrossoverStrategy {
    config: MACrossoverConfig,
    gate: DailyEntryGate,
}

impl MACrossoverStrategy {
    /// Create a new MA Crossover generator.
    pub fn new(config: MACrossoverConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            config,
            gate: DailyEntryGate::new(),
        })
    }

    /// Bars needed to compare the previous and current averages.
    pub fn warmup_period(&self) -> usize {
        self.config.slow_period + 1
    }

    /// Crossover direction between the two most recent bars, if any.
    fn crossover(&self, symbol: &str, closes: &[f64]) -> Result<Option<Side>, DataError> {
        let (fast, slow) = (self.config.fast_period, self.config.slow_period);
        let insufficient = || DataError::InsufficientBars {
            symbol: symbol.to_string(),
            required: self.warmup_period(),
            available: closes.len(),
        };
        let Some((_, previous)) = closes.split_last() else {
            return Err(insufficient());
        };

        let averages = (
            sma(previous, fast),
            sma(previous, slow),
            sma(closes, fast),
            sma(closes, slow),
        );
        let (Some(prev_fast), Some(prev_slow), Some(fast_ma), Some(slow_ma)) = averages else {
            return Err(insufficient());
        };

        debug!(symbol, prev_fast, prev_slow, fast_ma, slow_ma, "ma crossover evaluated");

        let side = if prev_fast <= prev_slow && fast_ma > slow_ma {
            Some(Side::Buy)
        } else if prev_fast >= prev_slow && fast_ma < slow_ma {
            Some(Side::Sell)
        } else {
            None
        };
        Ok(side)
    }
}

impl SignalGenerator for MACrossoverStrategy {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn description(&self) -> &str {
        "Generates signals based on fast/slow moving average crossovers"
    }

    fn on_market_update(
        &mut self,
        update: &MarketUpdate,
        ctx: &SignalContext<'_>,
    ) -> Result<Option<Event>, StrategyError> {
        let symbol = update.symbol.as_str();
        let today = update.timestamp.date_naive();
        if !self.gate.is_open(symbol, today) {
            return Ok(None);
        }

        let bars = ctx.market_data.get_latest_closed_bars(
            symbol,
            self.config.timeframe,
            self.warmup_period(),
        )?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let Some(side) = self.crossover(symbol, &closes)? else {
            return Ok(None);
        };

        if ctx.portfolio.position_counts(symbol).on(side) > 0 {
            debug!(symbol, %side, "crossover ignored, position already open");
            return Ok(None);
        }

        self.gate.record(symbol, today);
        info!(symbol, %side, "ma crossover entry");

        Ok(Some(
            EntrySignal {
                symbol: symbol.to_string(),
                side,
                order_kind: OrderKind::Market,
                target_price: None,
                magic_number: ctx.portfolio.magic_number,
                stop_loss: None,
                take_profit: None,
                close_opposite: true,
                generator: self.name().to_string(),
            }
            .into(),
        ))
    }

    fn symbols(&self) -> &[String] {
        &self.config.symbols
    }

    fn timeframe(&self) -> Timeframe {
        self.config.timeframe
    }
}
