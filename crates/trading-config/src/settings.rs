//! Configuration structures.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::types::{SymbolInfo, Timeframe};
use trading_data::RandomWalkConfig;
use trading_director::{ExecutionPolicy, DEFAULT_CAPACITY};
use trading_risk::{PositionSizer, PositionSizingMethod, RiskConfig};
use trading_strategies::GeneratorSettings;

use crate::ConfigError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub trading: TradingSettings,
    /// Generators to run; each may name its own symbols and timeframe,
    /// otherwise the `trading` ones apply
    #[serde(default)]
    pub strategies: Vec<GeneratorSettings>,
    #[serde(default)]
    pub sizing: PositionSizingMethod,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub execution: ExecutionPolicy,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub paper: PaperSettings,
}

impl AppConfig {
    /// Generator settings with the `trading` symbols and timeframe filled in.
    pub fn generator_settings(&self) -> Vec<GeneratorSettings> {
        self.strategies
            .iter()
            .cloned()
            .map(|s| s.bind(&self.trading.symbols, self.trading.timeframe))
            .collect()
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()?;
        self.trading.validate()?;

        if self.strategies.is_empty() {
            return invalid("at least one [[strategies]] entry is required");
        }
        for settings in self.generator_settings() {
            settings
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("strategy {}: {e}", settings.kind())))?;
        }

        PositionSizer::new(self.sizing.clone()).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.risk
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.execution
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.notifications.validate()?;
        self.paper.validate()
    }

    /// Render as TOML, e.g. to show the effective configuration.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn invalid<T>(message: impl Into<String>) -> Result<T, ConfigError> {
    Err(ConfigError::Invalid(message.into()))
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "trading-director".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Directory for daily rolling JSON log files
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.format.to_ascii_lowercase().as_str() {
            "pretty" | "json" => Ok(()),
            other => invalid(format!("logging.format must be pretty or json, got {other}")),
        }
    }
}

/// Markets traded and event bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSettings {
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    /// Tags every order and position of this instance
    pub magic_number: u64,
    /// Event bus capacity
    pub queue_capacity: usize,
    /// How often the bar poller checks for new closed bars
    pub poll_interval_ms: u64,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            symbols: vec!["EURUSD".to_string()],
            timeframe: Timeframe::Minute5,
            magic_number: 12345,
            queue_capacity: DEFAULT_CAPACITY,
            poll_interval_ms: 1_000,
        }
    }
}

impl TradingSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() || self.symbols.iter().any(|s| s.trim().is_empty()) {
            return invalid("trading.symbols must list at least one non-empty symbol");
        }
        if self.magic_number == 0 {
            return invalid("trading.magic_number must be non-zero");
        }
        if self.queue_capacity == 0 {
            return invalid("trading.queue_capacity must be positive");
        }
        if self.poll_interval_ms == 0 {
            return invalid("trading.poll_interval_ms must be positive");
        }
        Ok(())
    }
}

/// Telegram credentials are read from the named environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub telegram_enabled: bool,
    pub token_env: String,
    pub chat_id_env: String,
    pub timeout_ms: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            telegram_enabled: false,
            token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl NotificationSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_enabled && (self.token_env.is_empty() || self.chat_id_env.is_empty()) {
            return invalid("notifications need token_env and chat_id_env when Telegram is enabled");
        }
        if self.timeout_ms == 0 {
            return invalid("notifications.timeout_ms must be positive");
        }
        Ok(())
    }
}

/// Contract details used by the paper session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolSpec {
    pub point: Decimal,
    pub tick_size: Decimal,
    pub tick_value: Decimal,
    pub contract_size: Decimal,
    pub volume_min: Decimal,
    pub volume_max: Decimal,
    pub volume_step: Decimal,
    pub quote_to_account: Decimal,
}

impl Default for SymbolSpec {
    fn default() -> Self {
        Self {
            point: dec!(0.0001),
            tick_size: dec!(0.0001),
            tick_value: dec!(10),
            contract_size: dec!(100000),
            volume_min: dec!(0.01),
            volume_max: dec!(50),
            volume_step: dec!(0.01),
            quote_to_account: Decimal::ONE,
        }
    }
}

impl SymbolSpec {
    pub fn to_info(&self, symbol: &str) -> SymbolInfo {
        SymbolInfo {
            symbol: symbol.to_string(),
            point: self.point,
            tick_size: self.tick_size,
            tick_value: self.tick_value,
            contract_size: self.contract_size,
            volume_min: self.volume_min,
            volume_max: self.volume_max,
            volume_step: self.volume_step,
            quote_to_account: self.quote_to_account,
        }
    }

    fn validate(&self, symbol: &str) -> Result<(), ConfigError> {
        let positive = [
            ("point", self.point),
            ("tick_size", self.tick_size),
            ("tick_value", self.tick_value),
            ("contract_size", self.contract_size),
            ("volume_min", self.volume_min),
            ("volume_step", self.volume_step),
            ("quote_to_account", self.quote_to_account),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v <= Decimal::ZERO) {
            return invalid(format!("{symbol}: {name} must be positive"));
        }
        if self.volume_min > self.volume_max {
            return invalid(format!("{symbol}: volume_min exceeds volume_max"));
        }
        Ok(())
    }
}

/// Paper trading session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSettings {
    pub initial_balance: Decimal,
    pub commission_per_lot: Decimal,
    /// Directory holding `<SYMBOL>_<timeframe>.csv` files to seed history
    pub history_dir: Option<PathBuf>,
    pub feed: RandomWalkConfig,
    /// Contract details for symbols without an override
    pub default_symbol: SymbolSpec,
    pub symbols: BTreeMap<String, SymbolSpec>,
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
            commission_per_lot: Decimal::ZERO,
            history_dir: None,
            feed: RandomWalkConfig::default(),
            default_symbol: SymbolSpec::default(),
            symbols: BTreeMap::new(),
        }
    }
}

impl PaperSettings {
    /// Overrides are matched case-insensitively.
    pub fn symbol_info(&self, symbol: &str) -> SymbolInfo {
        self.symbols
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(symbol))
            .map(|(_, spec)| spec)
            .unwrap_or(&self.default_symbol)
            .to_info(symbol)
    }

    /// History file for `symbol` on `timeframe`, if a directory is set.
    pub fn history_file(&self, symbol: &str, timeframe: Timeframe) -> Option<PathBuf> {
        self.history_dir
            .as_ref()
            .map(|dir| dir.join(format!("{symbol}_{timeframe}.csv")))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_balance <= Decimal::ZERO {
            return invalid("paper.initial_balance must be positive");
        }
        if self.commission_per_lot < Decimal::ZERO {
            return invalid("paper.commission_per_lot may not be negative");
        }
        let feed = &self.feed;
        if !(feed.start_price.is_finite() && feed.start_price > 0.0) {
            return invalid("paper.feed.start_price must be positive");
        }
        if !(feed.volatility.is_finite() && feed.volatility >= 0.0) {
            return invalid("paper.feed.volatility may not be negative");
        }
        if feed.tick_interval_ms == 0 || feed.sim_seconds_per_tick <= 0 {
            return invalid("paper.feed tick interval and simulated seconds must be positive");
        }
        self.default_symbol.validate("paper.default_symbol")?;
        for (symbol, spec) in &self.symbols {
            spec.validate(symbol)?;
        }
        Ok(())
    }
}
