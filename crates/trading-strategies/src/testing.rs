//! Fixtures shared by the generator tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trading_core::error::DataError;
use trading_core::traits::MarketDataProvider;
use trading_core::types::{
    Bar, MarketUpdate, PortfolioSnapshot, Position, Side, SymbolInfo, Tick, Ticket, Timeframe,
};

pub const MAGIC: u64 = 777;

/// In-memory market with one symbol.
pub struct FakeMarket {
    pub bars: Vec<Bar>,
    pub tick: Option<Tick>,
    pub info: SymbolInfo,
    /// Return whatever bars exist instead of failing on a short history.
    pub lenient: bool,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            tick: None,
            info: SymbolInfo {
                symbol: "EURUSD".to_string(),
                point: dec!(0.0001),
                tick_size: dec!(0.0001),
                tick_value: dec!(10),
                contract_size: dec!(100000),
                volume_min: dec!(0.01),
                volume_max: dec!(50),
                volume_step: dec!(0.01),
                quote_to_account: dec!(1),
            },
            lenient: false,
        }
    }

    /// Flat bars with the given closes, one per timeframe step from `start`.
    pub fn with_closes(mut self, start: DateTime<Utc>, timeframe: Timeframe, closes: &[f64]) -> Self {
        let step = timeframe.as_secs() * 1000;
        self.bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start.timestamp_millis() + i as i64 * step, c, c, c, c, 1.0))
            .collect();
        self
    }

    pub fn short_history(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub fn with_tick(mut self, bid: Decimal, ask: Decimal) -> Self {
        self.tick = Some(Tick {
            symbol: "EURUSD".to_string(),
            bid,
            ask,
            timestamp: Utc::now(),
        });
        self
    }
}

impl MarketDataProvider for FakeMarket {
    fn get_bars_from_range(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let (start, end) = (start.timestamp_millis(), end.timestamp_millis());
        Ok(self
            .bars
            .iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .copied()
            .collect())
    }

    fn get_latest_closed_bars(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        if self.lenient {
            let skip = self.bars.len().saturating_sub(count);
            return Ok(self.bars[skip..].to_vec());
        }
        if self.bars.len() < count {
            return Err(DataError::InsufficientBars {
                symbol: symbol.to_string(),
                required: count,
                available: self.bars.len(),
            });
        }
        Ok(self.bars[self.bars.len() - count..].to_vec())
    }

    fn get_latest_tick(&self, symbol: &str) -> Result<Tick, DataError> {
        self.tick
            .clone()
            .ok_or_else(|| DataError::NoTick(symbol.to_string()))
    }

    fn symbol_info(&self, _symbol: &str) -> Result<SymbolInfo, DataError> {
        Ok(self.info.clone())
    }
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn update(timestamp: DateTime<Utc>, timeframe: Timeframe) -> MarketUpdate {
    MarketUpdate {
        symbol: "EURUSD".to_string(),
        timeframe,
        timestamp,
    }
}

pub fn empty_portfolio() -> PortfolioSnapshot {
    PortfolioSnapshot {
        magic_number: MAGIC,
        balance: dec!(10000),
        equity: dec!(10000),
        ..Default::default()
    }
}

pub fn position(ticket: Ticket, side: Side, entry: Decimal, stop: Option<Decimal>, target: Option<Decimal>) -> Position {
    Position {
        ticket,
        symbol: "EURUSD".to_string(),
        side,
        volume: dec!(0.1),
        entry_price: entry,
        stop_loss: stop,
        take_profit: target,
        magic_number: MAGIC,
        opened_at: Utc::now(),
    }
}
