//! Hand-written collaborators for director tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trading_core::error::{DataError, ExecutionError, RiskError, SizingError, StrategyError};
use trading_core::traits::{
    MarketDataProvider, Notifier, OrderExecutor, PortfolioSource, PositionSizing,
    RiskValidation, RiskVerdict, SignalContext, SignalGenerator,
};
use trading_core::types::{
    Bar, EntrySignal, Event, MarketUpdate, OrderKind, OrderRequest, PortfolioSnapshot,
    PositionUpdate, Side, SymbolInfo, Ticket, Tick, Timeframe, UpdateRequest,
};

pub const MAGIC: u64 = 9001;

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
}

pub fn update(symbol: &str) -> MarketUpdate {
    MarketUpdate {
        symbol: symbol.to_string(),
        timeframe: Timeframe::Minute5,
        timestamp: at(10, 0),
    }
}

pub fn entry(side: Side) -> EntrySignal {
    EntrySignal {
        symbol: "EURUSD".to_string(),
        side,
        order_kind: OrderKind::Market,
        target_price: None,
        magic_number: MAGIC,
        stop_loss: None,
        take_profit: None,
        close_opposite: false,
        generator: "scripted".to_string(),
    }
}

pub fn trail(ticket: Ticket, stop: Decimal) -> PositionUpdate {
    PositionUpdate {
        symbol: "EURUSD".to_string(),
        ticket,
        magic_number: MAGIC,
        new_stop_loss: stop,
        take_profit: Some(dec!(1.1100)),
    }
}

/// Quote and contract data for EURUSD only.
pub struct FakeMarket {
    tick: Mutex<Tick>,
}

impl FakeMarket {
    pub fn eurusd() -> Self {
        Self {
            tick: Mutex::new(Tick {
                symbol: "EURUSD".to_string(),
                bid: dec!(1.1000),
                ask: dec!(1.1002),
                timestamp: at(10, 0),
            }),
        }
    }

    pub fn set_quote(&self, bid: Decimal, ask: Decimal) {
        let mut tick = self.tick.lock();
        tick.bid = bid;
        tick.ask = ask;
    }
}

impl MarketDataProvider for FakeMarket {
    fn get_bars_from_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        Err(DataError::NoBars {
            symbol: symbol.to_string(),
            timeframe,
        })
    }

    fn get_latest_closed_bars(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        Err(DataError::InsufficientBars {
            symbol: symbol.to_string(),
            required: count,
            available: 0,
        })
    }

    fn get_latest_tick(&self, symbol: &str) -> Result<Tick, DataError> {
        let tick = self.tick.lock();
        if tick.symbol == symbol {
            Ok(tick.clone())
        } else {
            Err(DataError::NoTick(symbol.to_string()))
        }
    }

    fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, DataError> {
        if symbol != "EURUSD" {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }
        Ok(SymbolInfo {
            symbol: symbol.to_string(),
            point: dec!(0.0001),
            tick_size: dec!(0.0001),
            tick_value: dec!(10),
            contract_size: dec!(100000),
            volume_min: dec!(0.01),
            volume_max: dec!(50),
            volume_step: dec!(0.01),
            quote_to_account: dec!(1),
        })
    }
}

pub struct FakePortfolio {
    snapshot: PortfolioSnapshot,
}

impl FakePortfolio {
    pub fn new() -> Self {
        Self {
            snapshot: PortfolioSnapshot {
                magic_number: MAGIC,
                balance: dec!(10000),
                equity: dec!(10000),
                positions: Vec::new(),
                pending_orders: Vec::new(),
            },
        }
    }
}

impl PortfolioSource for FakePortfolio {
    fn snapshot(&self) -> PortfolioSnapshot {
        self.snapshot.clone()
    }
}

/// What a scripted generator does on its next call.
pub enum Step {
    Emit(Event),
    Quiet,
    Fail(StrategyError),
    Panic,
}

/// Generator replaying a fixed script, then staying quiet.
pub struct ScriptedGenerator {
    name: String,
    symbols: Vec<String>,
    script: VecDeque<Step>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    pub fn new(name: &str, script: Vec<Step>) -> Self {
        Self {
            name: name.to_string(),
            symbols: vec!["EURUSD".to_string()],
            script: script.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl SignalGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_market_update(
        &mut self,
        _update: &MarketUpdate,
        ctx: &SignalContext<'_>,
    ) -> Result<Option<Event>, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(ctx.portfolio.magic_number, MAGIC);
        match self.script.pop_front().unwrap_or(Step::Quiet) {
            Step::Emit(event) => Ok(Some(event)),
            Step::Quiet => Ok(None),
            Step::Fail(err) => Err(err),
            Step::Panic => panic!("generator bug"),
        }
    }

    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::Minute5
    }
}

/// Sizer returning a fixed volume and counting calls.
pub struct CountingSizer {
    volume: Decimal,
    pub calls: AtomicUsize,
}

impl CountingSizer {
    pub fn fixed(volume: Decimal) -> Self {
        Self {
            volume,
            calls: AtomicUsize::new(0),
        }
    }
}

impl PositionSizing for CountingSizer {
    fn size(
        &self,
        signal: &EntrySignal,
        _market_data: &dyn MarketDataProvider,
        _portfolio: &dyn PortfolioSource,
    ) -> Result<Decimal, SizingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.volume <= Decimal::ZERO {
            return Err(SizingError::BelowMinimum {
                symbol: signal.symbol.clone(),
                volume: self.volume,
                minimum: dec!(0.01),
            });
        }
        Ok(self.volume)
    }
}

/// Risk check returning a fixed verdict and counting calls.
pub struct CountingRisk {
    verdict: RiskVerdict,
    pub calls: AtomicUsize,
}

impl CountingRisk {
    pub fn new(verdict: RiskVerdict) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
        }
    }
}

impl RiskValidation for CountingRisk {
    fn validate(
        &self,
        _signal: &EntrySignal,
        _volume: Decimal,
        portfolio: &dyn PortfolioSource,
        _market_data: &dyn MarketDataProvider,
    ) -> Result<RiskVerdict, RiskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(portfolio.snapshot().equity, dec!(10000));
        Ok(self.verdict.clone())
    }
}

/// Executor recording every request it receives.
#[derive(Default)]
pub struct RecordingExecutor {
    pub submitted: Mutex<Vec<OrderRequest>>,
    pub modified: Mutex<Vec<UpdateRequest>>,
    pub closed: Mutex<Vec<(String, Side, u64)>>,
    /// Every call takes this long
    pub delay: Option<Duration>,
    /// Failures returned by the next submits, in order
    pub failures: Mutex<VecDeque<ExecutionError>>,
}

impl RecordingExecutor {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing(failures: Vec<ExecutionError>) -> Self {
        Self {
            failures: Mutex::new(failures.into()),
            ..Self::default()
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl OrderExecutor for RecordingExecutor {
    async fn submit_order(&self, request: OrderRequest) -> Result<Ticket, ExecutionError> {
        self.pause().await;
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }
        let mut submitted = self.submitted.lock();
        submitted.push(request);
        Ok(submitted.len() as Ticket)
    }

    async fn modify_order(&self, request: UpdateRequest) -> Result<(), ExecutionError> {
        self.pause().await;
        self.modified.lock().push(request);
        Ok(())
    }

    async fn close_positions(
        &self,
        symbol: &str,
        side: Side,
        magic_number: u64,
    ) -> Result<Vec<Ticket>, ExecutionError> {
        self.pause().await;
        self.closed.lock().push((symbol.to_string(), side, magic_number));
        Ok(vec![99])
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
