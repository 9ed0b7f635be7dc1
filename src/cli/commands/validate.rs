//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::load_config;

pub fn run(config_path: &Path, print: bool) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Symbols: {}", config.trading.symbols.join(", "));
            println!("Timeframe: {}", config.trading.timeframe);
            println!("Magic number: {}", config.trading.magic_number);
            for settings in config.generator_settings() {
                let (symbols, timeframe) = settings.market();
                println!("Generator: {} on {} {}", settings.kind(), symbols.join(", "), timeframe);
            }
            println!("Sizing: {:?}", config.sizing);
            println!("Max leverage: {}x", config.risk.max_leverage_factor);
            println!(
                "Executor timeout: {} ms, {} retries",
                config.execution.timeout_ms, config.execution.max_retries
            );
            println!("Telegram: {}", if config.notifications.telegram_enabled { "on" } else { "off" });

            if print {
                println!();
                println!("{}", config.to_toml()?);
            }
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
