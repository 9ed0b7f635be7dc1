//! RSI mean-reversion generator.
//!
//! Buys when RSI drops below the lower threshold and sells when it rises
//! above the upper threshold, closing the opposite side first.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trading_core::{
    error::{DataError, StrategyError},
    traits::{GeneratorConfig, SignalContext, SignalGenerator},
    types::{EntrySignal, Event, MarketUpdate, OrderKind, Side, Timeframe},
};

use crate::gate::DailyEntryGate;
use crate::indicators::rsi;

/// Configuration for the RSI generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    /// Symbols to trade
    pub symbols: Vec<String>,
    /// Bar timeframe
    pub timeframe: Timeframe,
    /// RSI calculation period
    pub rsi_period: usize,
    /// Sell above this level
    pub rsi_upper: f64,
    /// Buy below this level
    pub rsi_lower: f64,
    /// Stop-loss distance in points, 0 for none
    pub sl_points: u32,
    /// Take-profit distance in points, 0 for none
    pub tp_points: u32,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            symbols: vec![],
            timeframe: Timeframe::default(),
            rsi_period: 14,
            rsi_upper: 70.0,
            rsi_lower: 30.0,
            sl_points: 0,
            tp_points: 0,
        }
    }
}

impl GeneratorConfig for RsiConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.rsi_period < 2 {
            return Err(StrategyError::InvalidConfig(
                "RSI period must be at least 2".into(),
            ));
        }
        if self.rsi_upper <= self.rsi_lower {
            return Err(StrategyError::InvalidConfig(
                "Upper threshold must be greater than lower threshold".into(),
            ));
        }
        if self.rsi_upper > 100.0 || self.rsi_lower < 0.0 {
            return Err(StrategyError::InvalidConfig(
                "RSI thresholds must be between 0 and 100".into(),
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

/// RSI mean-reversion generator.
pub struct RsiStrategy {
    config: RsiConfig,
    gate: DailyEntryGate,
}

impl RsiStrategy {
    /// Create a new RSI generator.
    pub fn new(config: RsiConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            config,
            gate: DailyEntryGate::new(),
        })
    }

    pub fn warmup_period(&self) -> usize {
        self.config.rsi_period * 3 + 1
    }

    fn offset(points: u32, point: Decimal) -> Option<Decimal> {
        (points > 0).then(|| Decimal::from(points) * point)
    }
}

impl SignalGenerator for RsiStrategy {
    fn name(&self) -> &str {
        "rsi"
    }

    fn description(&self) -> &str {
        "Mean reversion on RSI overbought/oversold levels"
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
        let value = rsi(&closes, self.config.rsi_period).ok_or_else(|| {
            DataError::InsufficientBars {
                symbol: symbol.to_string(),
                required: self.warmup_period(),
                available: closes.len(),
            }
        })?;
        debug!(symbol, rsi = value, "rsi evaluated");

        let counts = ctx.portfolio.position_counts(symbol);
        let side = if value < self.config.rsi_lower && counts.long == 0 {
            Side::Buy
        } else if value > self.config.rsi_upper && counts.short == 0 {
            Side::Sell
        } else {
            return Ok(None);
        };

        let tick = ctx.market_data.get_latest_tick(symbol)?;
        let info = ctx.market_data.symbol_info(symbol)?;
        let entry = tick.entry_price(side);
        let sign = side.sign();
        let stop_loss = Self::offset(self.config.sl_points, info.point).map(|d| entry - d * sign);
        let take_profit = Self::offset(self.config.tp_points, info.point).map(|d| entry + d * sign);

        self.gate.record(symbol, today);
        info!(symbol, %side, rsi = value, "rsi entry");

        Ok(Some(
            EntrySignal {
                symbol: symbol.to_string(),
                side,
                order_kind: OrderKind::Market,
                target_price: None,
                magic_number: ctx.portfolio.magic_number,
                stop_loss,
                take_profit,
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
