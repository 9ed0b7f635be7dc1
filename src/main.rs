//! Trading director CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use trading_config::{load_config, LoggingConfig};
use trading_monitor::setup_logging;

fn init_logging(cli: &Cli, logging: &LoggingConfig) -> Option<WorkerGuard> {
    let level = cli.log_level.map_or(logging.level.as_str(), |l| l.as_str());
    let json = cli.json_logs || logging.is_json();
    setup_logging(level, json, logging.file.as_deref().map(Path::new))
}

/// Logging for commands that run without a loaded configuration.
fn init_default_logging(cli: &Cli) -> Option<WorkerGuard> {
    let level = cli.log_level.map_or("warn", |l| l.as_str());
    setup_logging(level, cli.json_logs, None)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => {
            let config = load_config(&cli.config)
                .with_context(|| format!("loading {}", cli.config.display()))?;
            let _guard = init_logging(&cli, &config.logging);
            cli::commands::run::run(config, args).await
        }
        Commands::Strategies => {
            let _guard = init_default_logging(&cli);
            cli::commands::strategies::run()
        }
        Commands::ValidateConfig(args) => {
            let _guard = init_default_logging(&cli);
            cli::commands::validate::run(&cli.config, args.print)
        }
    }
}
