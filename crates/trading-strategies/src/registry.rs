//! Generator registry and tagged settings.

use crate::{
    MACrossoverConfig, MACrossoverStrategy, RangeBreakoutConfig, RangeBreakoutStrategy,
    RsiConfig, RsiStrategy,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trading_core::{
    error::StrategyError,
    traits::{GeneratorConfig, SignalGenerator},
    types::Timeframe,
};

/// Settings for one generator, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorSettings {
    MaCrossover(MACrossoverConfig),
    Rsi(RsiConfig),
    RangeBreakout(RangeBreakoutConfig),
}

impl GeneratorSettings {
    /// Registry key of this generator kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorSettings::MaCrossover(_) => "ma_crossover",
            GeneratorSettings::Rsi(_) => "rsi",
            GeneratorSettings::RangeBreakout(_) => "range_breakout",
        }
    }

    /// Apply the trading universe unless the settings carry their own.
    pub fn bind(mut self, symbols: &[String], timeframe: Timeframe) -> Self {
        fn apply(own: &mut Vec<String>, tf: &mut Timeframe, symbols: &[String], timeframe: Timeframe) {
            if own.is_empty() {
                *own = symbols.to_vec();
                *tf = timeframe;
            }
        }
        match &mut self {
            GeneratorSettings::MaCrossover(c) => apply(&mut c.symbols, &mut c.timeframe, symbols, timeframe),
            GeneratorSettings::Rsi(c) => apply(&mut c.symbols, &mut c.timeframe, symbols, timeframe),
            GeneratorSettings::RangeBreakout(c) => {
                apply(&mut c.symbols, &mut c.timeframe, symbols, timeframe)
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        match self {
            GeneratorSettings::MaCrossover(c) => c.validate(),
            GeneratorSettings::Rsi(c) => c.validate(),
            GeneratorSettings::RangeBreakout(c) => c.validate(),
        }
    }

    /// Symbols and timeframe the generator will subscribe to.
    pub fn market(&self) -> (&[String], Timeframe) {
        match self {
            GeneratorSettings::MaCrossover(c) => (&c.symbols, c.timeframe),
            GeneratorSettings::Rsi(c) => (&c.symbols, c.timeframe),
            GeneratorSettings::RangeBreakout(c) => (&c.symbols, c.timeframe),
        }
    }
}

/// Information about a registered generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry key
    pub name: String,
    pub description: String,
    /// Default settings as JSON
    pub default_config: serde_json::Value,
}

/// Registry of the built-in generators.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a registry with all built-in generators.
    pub fn new() -> Self {
        let defaults = [
            (
                GeneratorSettings::MaCrossover(MACrossoverConfig::default()),
                "Fast/slow simple moving average crossover, closes the opposite side",
            ),
            (
                GeneratorSettings::Rsi(RsiConfig::default()),
                "RSI mean reversion with optional point-based stop and target",
            ),
            (
                GeneratorSettings::RangeBreakout(RangeBreakoutConfig::default()),
                "Fades breakouts of a daily reference range with a trailing stop",
            ),
        ];

        let strategies = defaults
            .into_iter()
            .map(|(settings, description)| {
                let name = settings.kind().to_string();
                let info = StrategyInfo {
                    name: name.clone(),
                    description: description.to_string(),
                    default_config: serde_json::to_value(&settings).unwrap_or_default(),
                };
                (name, info)
            })
            .collect();

        Self { strategies }
    }

    /// List all available generators, sorted by name.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get generator info by name.
    pub fn get(&self, name: &str) -> Option<&StrategyInfo> {
        self.strategies.get(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Build a generator, validating its settings.
    pub fn build(&self, settings: GeneratorSettings) -> Result<Box<dyn SignalGenerator>, StrategyError> {
        let generator: Box<dyn SignalGenerator> = match settings {
            GeneratorSettings::MaCrossover(c) => Box::new(MACrossoverStrategy::new(c)?),
            GeneratorSettings::Rsi(c) => Box::new(RsiStrategy::new(c)?),
            GeneratorSettings::RangeBreakout(c) => Box::new(RangeBreakoutStrategy::new(c)?),
        };
        Ok(generator)
    }

    /// Build a generator from a name and JSON settings.
    pub fn create(
        &self,
        name: &str,
        config: serde_json::Value,
        symbols: &[String],
        timeframe: Timeframe,
    ) -> Result<Box<dyn SignalGenerator>, StrategyError> {
        if !self.exists(name) {
            return Err(StrategyError::NotFound(name.to_string()));
        }
        let mut tagged = config;
        if let Some(object) = tagged.as_object_mut() {
            object.insert("kind".to_string(), serde_json::Value::from(name));
        }
        let settings: GeneratorSettings = serde_json::from_value(tagged)
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        self.build(settings.bind(symbols, timeframe))
    }

    /// Build a generator with default settings.
    pub fn create_default(
        &self,
        name: &str,
        symbols: &[String],
        timeframe: Timeframe,
    ) -> Result<Box<dyn SignalGenerator>, StrategyError> {
        let info = self
            .get(name)
            .ok_or_else(|| StrategyError::NotFound(name.to_string()))?;
        self.create(name, info.default_config.clone(), symbols, timeframe)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
