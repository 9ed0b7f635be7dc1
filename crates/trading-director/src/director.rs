//! The trading director: a single consumer loop routing events through
//! generators, sizing, risk and execution.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use trading_core::traits::{
    MarketDataProvider, Notifier, OrderExecutor, PortfolioSource, PositionSizing,
    RiskValidation, RiskVerdict, SignalContext, SignalGenerator,
};
use trading_core::types::{EntrySignal, Event, MarketUpdate, OrderRequest, PositionUpdate, UpdateRequest};
use trading_core::{TradingError, TradingResult};

use crate::bus::{Envelope, EventReceiver};
use crate::execution::ExecutionPolicy;
use crate::panic_message;

/// Counters reported when the director stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectorStats {
    /// Events taken off the queue
    pub events_processed: u64,
    pub entry_signals: u64,
    pub position_updates: u64,
    pub orders_submitted: u64,
    pub stops_modified: u64,
    /// Entry signals refused by the risk check
    pub signals_rejected: u64,
    /// Cycles skipped for missing market data
    pub cycles_skipped: u64,
    /// Stage errors and panics
    pub failures: u64,
    /// Events still queued when the stop sentinel arrived
    pub events_discarded: u64,
}

/// Collects the director's collaborators.
#[derive(Default)]
pub struct DirectorBuilder {
    generators: Vec<Box<dyn SignalGenerator>>,
    sizer: Option<Arc<dyn PositionSizing>>,
    risk: Option<Arc<dyn RiskValidation>>,
    executor: Option<Arc<dyn OrderExecutor>>,
    market_data: Option<Arc<dyn MarketDataProvider>>,
    portfolio: Option<Arc<dyn PortfolioSource>>,
    notifier: Option<Arc<dyn Notifier>>,
    policy: ExecutionPolicy,
}

impl DirectorBuilder {
    pub fn generator(mut self, generator: Box<dyn SignalGenerator>) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn generators(mut self, generators: impl IntoIterator<Item = Box<dyn SignalGenerator>>) -> Self {
        self.generators.extend(generators);
        self
    }

    pub fn sizer(mut self, sizer: Arc<dyn PositionSizing>) -> Self {
        self.sizer = Some(sizer);
        self
    }

    pub fn risk(mut self, risk: Arc<dyn RiskValidation>) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn OrderExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn market_data(mut self, market_data: Arc<dyn MarketDataProvider>) -> Self {
        self.market_data = Some(market_data);
        self
    }

    pub fn portfolio(mut self, portfolio: Arc<dyn PortfolioSource>) -> Self {
        self.portfolio = Some(portfolio);
        self
    }

    /// Optional; without one nothing is sent.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self, receiver: EventReceiver) -> TradingResult<TradingDirector> {
        fn required<T>(component: Option<T>, name: &str) -> TradingResult<T> {
            component.ok_or_else(|| {
                TradingError::InvalidConfiguration(format!("trading director needs {name}"))
            })
        }

        if self.generators.is_empty() {
            return Err(TradingError::InvalidConfiguration(
                "trading director needs at least one signal generator".to_string(),
            ));
        }
        self.policy.validate()?;

        Ok(TradingDirector {
            receiver,
            generators: self.generators,
            sizer: required(self.sizer, "a position sizer")?,
            risk: required(self.risk, "a risk manager")?,
            executor: required(self.executor, "an order executor")?,
            market_data: required(self.market_data, "a market data provider")?,
            portfolio: required(self.portfolio, "a portfolio source")?,
            notifier: self.notifier,
            policy: self.policy,
            stats: DirectorStats::default(),
        })
    }
}

/// Consumes the event bus until the stop sentinel or until every producer
/// is gone. Events are handled strictly one at a time, in queue order.
pub struct TradingDirector {
    receiver: EventReceiver,
    generators: Vec<Box<dyn SignalGenerator>>,
    sizer: Arc<dyn PositionSizing>,
    risk: Arc<dyn RiskValidation>,
    executor: Arc<dyn OrderExecutor>,
    market_data: Arc<dyn MarketDataProvider>,
    portfolio: Arc<dyn PortfolioSource>,
    notifier: Option<Arc<dyn Notifier>>,
    policy: ExecutionPolicy,
    stats: DirectorStats,
}

impl TradingDirector {
    pub fn builder() -> DirectorBuilder {
        DirectorBuilder::default()
    }

    pub fn generator_names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Run the loop and return the final counters.
    pub async fn run(mut self) -> DirectorStats {
        info!(
            generators = ?self.generator_names(),
            executor = self.executor.name(),
            "Trading director started"
        );
        self.notify("Trading director started");

        while let Some(envelope) = self.receiver.recv().await {
            match envelope {
                Envelope::Event(event) => self.dispatch(event).await,
                Envelope::Stop => {
                    info!("Stop requested");
                    break;
                }
            }
        }

        self.stats.events_discarded = self.receiver.discard_pending() as u64;
        let stats = self.stats;
        info!(
            processed = stats.events_processed,
            orders = stats.orders_submitted,
            stops_modified = stats.stops_modified,
            rejected = stats.signals_rejected,
            failures = stats.failures,
            discarded = stats.events_discarded,
            "Trading director stopped"
        );
        self.notify(&format!(
            "Trading director stopped: {} orders, {} stop updates, {} failures",
            stats.orders_submitted, stats.stops_modified, stats.failures
        ));
        stats
    }

    async fn dispatch(&mut self, event: Event) {
        self.stats.events_processed += 1;
        debug!(event = event.kind(), symbol = event.symbol(), "Dispatching");

        match event {
            Event::MarketUpdate(update) => self.on_market_update(update).await,
            other => self.route(other).await,
        }
    }

    /// Handle an entry signal or position update, wherever it came from.
    async fn route(&mut self, event: Event) {
        let kind = event.kind();
        let symbol = event.symbol().to_string();
        let result = match event {
            Event::EntrySignal(signal) => self.on_entry_signal(signal).await,
            Event::PositionUpdate(update) => self.on_position_update(update).await,
            Event::MarketUpdate(_) => {
                warn!(symbol = %symbol, "Generators may not emit market updates, ignored");
                Ok(())
            }
        };
        if let Err(err) = result {
            self.report(kind, &symbol, err);
        }
    }

    async fn on_market_update(&mut self, update: MarketUpdate) {
        let snapshot = self.portfolio.snapshot();
        let ctx = SignalContext {
            market_data: self.market_data.as_ref(),
            portfolio: &snapshot,
        };

        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        for generator in self.generators.iter_mut().filter(|g| g.handles(&update)) {
            let outcome = catch_unwind(AssertUnwindSafe(|| generator.on_market_update(&update, &ctx)));
            match outcome {
                Ok(Ok(Some(event))) => outputs.push(event),
                Ok(Ok(None)) => {}
                Ok(Err(err)) => failures.push((generator.name().to_string(), TradingError::from(err))),
                Err(payload) => failures.push((
                    generator.name().to_string(),
                    TradingError::Panicked(panic_message(payload.as_ref())),
                )),
            }
        }

        for (generator, err) in failures {
            self.report(&generator, &update.symbol, err);
        }
        for event in outputs {
            self.route(event).await;
        }
    }

    async fn on_entry_signal(&mut self, signal: EntrySignal) -> TradingResult<()> {
        self.stats.entry_signals += 1;
        let market_data = self.market_data.as_ref();
        let portfolio = self.portfolio.as_ref();

        let volume = guarded(|| self.sizer.size(&signal, market_data, portfolio))??;
        let verdict = guarded(|| self.risk.validate(&signal, volume, portfolio, market_data))??;

        let volume = match verdict {
            RiskVerdict::Approve => volume,
            RiskVerdict::Adjust { volume: adjusted, reason } => {
                info!(
                    symbol = %signal.symbol,
                    requested = %volume,
                    volume = %adjusted,
                    reason = %reason,
                    "Volume reduced by risk check"
                );
                adjusted
            }
            RiskVerdict::Reject { reason } => {
                self.stats.signals_rejected += 1;
                info!(
                    symbol = %signal.symbol,
                    side = %signal.side,
                    generator = %signal.generator,
                    reason = %reason,
                    "Entry rejected by risk check"
                );
                return Ok(());
            }
        };

        let executor = self.executor.as_ref();
        if signal.close_opposite {
            let symbol = signal.symbol.as_str();
            let side = signal.side.opposite();
            let magic = signal.magic_number;
            let closed = self
                .policy
                .run("close_positions", symbol, market_data, move || {
                    executor.close_positions(symbol, side, magic)
                })
                .await?;
            if !closed.is_empty() {
                info!(symbol, side = %side, tickets = ?closed, "Closed opposite positions");
            }
        }

        let request = OrderRequest::from_signal(&signal, volume);
        let order = &request;
        let ticket = self
            .policy
            .run("submit_order", &request.symbol, market_data, move || {
                executor.submit_order(order.clone())
            })
            .await?;

        self.stats.orders_submitted += 1;
        info!(
            ticket,
            symbol = %request.symbol,
            side = %request.side,
            kind = %request.kind,
            volume = %request.volume,
            generator = %signal.generator,
            "Order submitted"
        );
        self.notify(&format!(
            "{} {} {} {} opened by {}, ticket {}",
            request.side, request.kind, request.volume, request.symbol, signal.generator, ticket
        ));
        Ok(())
    }

    /// Stop updates skip sizing and risk.
    async fn on_position_update(&mut self, update: PositionUpdate) -> TradingResult<()> {
        self.stats.position_updates += 1;
        let executor = self.executor.as_ref();
        let request = UpdateRequest::from(&update);
        let change = &request;

        self.policy
            .run("modify_order", &update.symbol, self.market_data.as_ref(), move || {
                executor.modify_order(change.clone())
            })
            .await?;

        self.stats.stops_modified += 1;
        info!(
            ticket = update.ticket,
            symbol = %update.symbol,
            stop_loss = %update.new_stop_loss,
            "Stop-loss moved"
        );
        Ok(())
    }

    fn report(&mut self, stage: &str, symbol: &str, err: TradingError) {
        if err.is_data_unavailable() {
            self.stats.cycles_skipped += 1;
            debug!(stage, symbol, error = %err, "Skipping cycle");
            return;
        }

        self.stats.failures += 1;
        match err {
            TradingError::Sizing(_) => {
                warn!(stage, symbol, error = %err, "Signal dropped by position sizer");
            }
            TradingError::Execution(_) | TradingError::Panicked(_) => {
                error!(stage, symbol, kind = err.kind(), error = %err, "Pipeline stage failed");
                self.notify(&format!("{stage} for {symbol} failed: {err}"));
            }
            _ => {
                error!(stage, symbol, kind = err.kind(), error = %err, "Pipeline stage failed");
            }
        }
    }

    fn notify(&self, message: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| notifier.notify(message))) {
                warn!(error = %panic_message(payload.as_ref()), "Notifier panicked");
            }
        }
    }
}

fn guarded<T>(stage: impl FnOnce() -> T) -> TradingResult<T> {
    catch_unwind(AssertUnwindSafe(stage))
        .map_err(|payload| TradingError::Panicked(panic_message(payload.as_ref())))
}
