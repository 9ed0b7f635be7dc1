//! Fakes shared by the sizing and risk tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use trading_core::error::DataError;
use trading_core::traits::{MarketDataProvider, PortfolioSource};
use trading_core::types::{
    Bar, EntrySignal, OrderKind, PendingOrder, PortfolioSnapshot, Position, Side, SymbolInfo,
    Tick, Timeframe,
};

pub const MAGIC: u64 = 4242;

pub struct FakeMarket {
    ticks: HashMap<String, Tick>,
    infos: HashMap<String, SymbolInfo>,
}

impl FakeMarket {
    /// EURUSD at 1.1000/1.1002, one tick of 0.0001 worth 1 per lot.
    pub fn eurusd() -> Self {
        let mut market = Self {
            ticks: HashMap::new(),
            infos: HashMap::new(),
        };
        market.add("EURUSD", dec!(1.1000), dec!(1.1002), info("EURUSD"));
        market
    }

    pub fn add(&mut self, symbol: &str, bid: Decimal, ask: Decimal, info: SymbolInfo) {
        self.ticks.insert(
            symbol.to_string(),
            Tick {
                symbol: symbol.to_string(),
                bid,
                ask,
                timestamp: Utc::now(),
            },
        );
        self.infos.insert(symbol.to_string(), info);
    }
}

pub fn info(symbol: &str) -> SymbolInfo {
    SymbolInfo {
        symbol: symbol.to_string(),
        point: dec!(0.0001),
        tick_size: dec!(0.0001),
        tick_value: dec!(1),
        contract_size: dec!(100000),
        volume_min: dec!(0.01),
        volume_max: dec!(50),
        volume_step: dec!(0.01),
        quote_to_account: dec!(1),
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
        self.ticks
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::NoTick(symbol.to_string()))
    }

    fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, DataError> {
        self.infos
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
    }
}

pub struct FakePortfolio {
    pub snapshot: PortfolioSnapshot,
}

impl FakePortfolio {
    pub fn new(equity: Decimal) -> Self {
        Self {
            snapshot: PortfolioSnapshot {
                magic_number: MAGIC,
                balance: equity,
                equity,
                ..Default::default()
            },
        }
    }

    pub fn with_position(mut self, symbol: &str, volume: Decimal, entry: Decimal) -> Self {
        let ticket = self.snapshot.positions.len() as u64 + 1;
        self.snapshot.positions.push(Position {
            ticket,
            symbol: symbol.to_string(),
            side: Side::Buy,
            volume,
            entry_price: entry,
            stop_loss: None,
            take_profit: None,
            // leverage counts the whole account, not only this instance
            magic_number: 1,
            opened_at: Utc::now(),
        });
        self
    }

    pub fn with_pending(mut self, symbol: &str, volume: Decimal, price: Decimal) -> Self {
        let ticket = 100 + self.snapshot.pending_orders.len() as u64;
        self.snapshot.pending_orders.push(PendingOrder {
            ticket,
            symbol: symbol.to_string(),
            side: Side::Sell,
            kind: OrderKind::Limit,
            price,
            volume,
            stop_loss: None,
            take_profit: None,
            magic_number: MAGIC,
        });
        self
    }
}

impl PortfolioSource for FakePortfolio {
    fn snapshot(&self) -> PortfolioSnapshot {
        self.snapshot.clone()
    }
}

pub fn signal(side: Side, stop_loss: Option<Decimal>) -> EntrySignal {
    EntrySignal {
        symbol: "EURUSD".to_string(),
        side,
        order_kind: OrderKind::Market,
        target_price: None,
        magic_number: MAGIC,
        stop_loss,
        take_profit: None,
        close_opposite: false,
        generator: "test".to_string(),
    }
}
