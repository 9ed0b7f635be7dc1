//! Configuration management.
//!
//! A TOML file is layered with `TRADING__`-prefixed environment variables,
//! e.g. `TRADING__TRADING__MAGIC_NUMBER=42` or `TRADING__RISK__MAX_LEVERAGE_FACTOR=3`.

mod settings;

pub use settings::{
    AppConfig, AppSettings, LoggingConfig, NotificationSettings, PaperSettings, SymbolSpec,
    TradingSettings,
};

use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Load configuration from file and environment, then validate it.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    build(File::from(path).required(true))
}

/// Same as [`load_config`] for configuration held in memory.
pub fn load_config_str(toml: &str) -> Result<AppConfig, ConfigError> {
    build(File::from_str(toml, FileFormat::Toml))
}

fn build<S>(source: S) -> Result<AppConfig, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let config = Config::builder()
        .add_source(source)
        .add_source(
            Environment::with_prefix("TRADING")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}
