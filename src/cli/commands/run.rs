//! Paper trading session: random-walk feed, bar poller, paper broker and
//! the trading director, wired together until Ctrl-C.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};
use trading_broker::{ClosedTrade, PaperBroker};
use trading_config::{AppConfig, NotificationSettings};
use trading_core::traits::{Notifier, PortfolioSource};
use trading_data::{BarPoller, CsvDataSource, MarketDataStore, RandomWalkFeed};
use trading_director::{channel, DirectorStats, TradingDirector};
use trading_monitor::{LogNotifier, TelegramConfig, TelegramNotifier};
use trading_risk::{PositionSizer, RiskManager};
use trading_strategies::StrategyRegistry;

use crate::cli::RunArgs;

#[derive(Serialize)]
struct SessionSummary {
    stats: DirectorStats,
    balance: Decimal,
    equity: Decimal,
    open_positions: usize,
    closed_trades: Vec<ClosedTrade>,
}

pub async fn run(mut config: AppConfig, args: &RunArgs) -> Result<()> {
    if args.seed.is_some() {
        config.paper.feed.seed = args.seed;
    }
    let timeframe = config.trading.timeframe;
    let settings = config.generator_settings();

    let mut symbols: BTreeSet<String> = config.trading.symbols.iter().cloned().collect();
    for generator in &settings {
        let (generator_symbols, generator_timeframe) = generator.market();
        if generator_timeframe != timeframe {
            warn!(
                generator = generator.kind(),
                timeframe = %generator_timeframe,
                feed_timeframe = %timeframe,
                "The paper feed only builds {} bars, this generator will stay idle",
                timeframe
            );
        }
        symbols.extend(generator_symbols.iter().cloned());
    }

    let store = Arc::new(MarketDataStore::new());
    let broker = Arc::new(
        PaperBroker::new(config.trading.magic_number, config.paper.initial_balance, store.clone())
            .with_commission(config.paper.commission_per_lot),
    );

    // Simulated time starts at midnight so session windows see a full day.
    let start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    let mut feed = RandomWalkFeed::new(store.clone(), timeframe, config.paper.feed.clone(), start);
    for symbol in &symbols {
        feed.add_symbol(config.paper.symbol_info(symbol));
        seed_history(&config, &store, symbol);
    }
    feed.add_listener(broker.clone());

    let (publisher, receiver) = channel(config.trading.queue_capacity);
    let mut poller = BarPoller::new(
        store.clone(),
        Arc::new(publisher.clone()),
        Duration::from_millis(config.trading.poll_interval_ms),
    );
    for generator in &settings {
        let (generator_symbols, generator_timeframe) = generator.market();
        for symbol in generator_symbols {
            poller.subscribe(symbol, generator_timeframe);
        }
    }

    let registry = StrategyRegistry::new();
    let generators = settings
        .into_iter()
        .map(|s| registry.build(s))
        .collect::<Result<Vec<_>, _>>()?;

    let director = TradingDirector::builder()
        .generators(generators)
        .sizer(Arc::new(PositionSizer::new(config.sizing.clone())?))
        .risk(Arc::new(RiskManager::new(config.risk.clone())?))
        .executor(broker.clone())
        .market_data(store.clone())
        .portfolio(broker.clone())
        .notifier(build_notifier(&config.notifications)?)
        .policy(config.execution.clone())
        .build(receiver)?;

    info!(
        symbols = ?symbols,
        timeframe = %timeframe,
        generators = ?director.generator_names(),
        balance = %config.paper.initial_balance,
        "Starting paper session"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_task = tokio::spawn(poller.run(shutdown_rx.clone()));
    let feed_task = tokio::spawn(feed.run(shutdown_rx));
    let director_task = tokio::spawn(director.run());

    match args.seconds {
        Some(seconds) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(seconds)) => info!(seconds, "Session time elapsed"),
                signal = tokio::signal::ctrl_c() => signal.context("listening for Ctrl-C")?,
            }
        }
        None => tokio::signal::ctrl_c().await.context("listening for Ctrl-C")?,
    }
    info!("Shutting down");

    publisher.stop().await?;
    let stats = director_task.await?;
    let _ = shutdown_tx.send(true);
    feed_task.await?;
    poller_task.await?;

    let snapshot = broker.snapshot();
    let summary = SessionSummary {
        stats,
        balance: snapshot.balance,
        equity: snapshot.equity,
        open_positions: snapshot.positions.len(),
        closed_trades: broker.closed_trades(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn seed_history(config: &AppConfig, store: &MarketDataStore, symbol: &str) {
    let timeframe = config.trading.timeframe;
    let Some(path) = config.paper.history_file(symbol, timeframe) else {
        return;
    };
    if !path.exists() {
        info!(symbol, path = %path.display(), "No history file, starting without bars");
        return;
    }
    let seeded = CsvDataSource::new(&path).and_then(|source| source.seed(store, symbol, timeframe));
    if let Err(e) = seeded {
        warn!(symbol, path = %path.display(), error = %e, "Failed to load history");
    }
}

fn build_notifier(settings: &NotificationSettings) -> Result<Arc<dyn Notifier>> {
    if !settings.telegram_enabled {
        return Ok(Arc::new(LogNotifier));
    }
    let token = std::env::var(&settings.token_env)
        .with_context(|| format!("{} is not set", settings.token_env))?;
    let chat_id = std::env::var(&settings.chat_id_env)
        .with_context(|| format!("{} is not set", settings.chat_id_env))?;
    let telegram = TelegramNotifier::new(&TelegramConfig {
        token,
        chat_id,
        timeout_ms: settings.timeout_ms,
    })?;
    Ok(Arc::new(telegram))
}

fn print_summary(summary: &SessionSummary) {
    let stats = &summary.stats;
    println!();
    println!("Session Summary");
    println!("═══════════════════════════════════════════════════════════");
    println!("  Events processed:   {}", stats.events_processed);
    println!("  Entry signals:      {}", stats.entry_signals);
    println!("  Orders submitted:   {}", stats.orders_submitted);
    println!("  Stops moved:        {}", stats.stops_modified);
    println!("  Rejected by risk:   {}", stats.signals_rejected);
    println!("  Skipped cycles:     {}", stats.cycles_skipped);
    println!("  Failures:           {}", stats.failures);
    println!("  Discarded at stop:  {}", stats.events_discarded);
    println!("───────────────────────────────────────────────────────────");
    println!("  Balance:            {:.2}", summary.balance);
    println!("  Equity:             {:.2}", summary.equity);
    println!("  Open positions:     {}", summary.open_positions);
    println!("  Closed trades:      {}", summary.closed_trades.len());
    for trade in &summary.closed_trades {
        println!(
            "    #{} {} {} {} @ {} -> {} ({:?}) {:.2}",
            trade.ticket,
            trade.side,
            trade.volume,
            trade.symbol,
            trade.entry_price,
            trade.exit_price,
            trade.reason,
            trade.profit
        );
    }
}
