//! Events flowing through the trading director.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderKind, Side, Ticket, Timeframe};

/// A new closed bar is available for `symbol` on `timeframe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketUpdate {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Time the update was observed. Generators read "now" from here.
    pub timestamp: DateTime<Utc>,
}

/// Request to open a new position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    pub symbol: String,
    pub side: Side,
    pub order_kind: OrderKind,
    /// Trigger/limit price, only meaningful for pending order kinds
    pub target_price: Option<Decimal>,
    pub magic_number: u64,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// Close this instance's positions on the other side before entering
    pub close_opposite: bool,
    /// Name of the generator that produced the signal
    pub generator: String,
}

/// Request to move the stop/target of an existing position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub symbol: String,
    pub ticket: Ticket,
    pub magic_number: u64,
    pub new_stop_loss: Decimal,
    pub take_profit: Option<Decimal>,
}

/// Everything the director knows how to route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    MarketUpdate(MarketUpdate),
    EntrySignal(EntrySignal),
    PositionUpdate(PositionUpdate),
}

impl Event {
    /// Tag name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::MarketUpdate(_) => "market_update",
            Event::EntrySignal(_) => "entry_signal",
            Event::PositionUpdate(_) => "position_update",
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Event::MarketUpdate(e) => &e.symbol,
            Event::EntrySignal(e) => &e.symbol,
            Event::PositionUpdate(e) => &e.symbol,
        }
    }
}

impl From<MarketUpdate> for Event {
    fn from(update: MarketUpdate) -> Self {
        Event::MarketUpdate(update)
    }
}

impl From<EntrySignal> for Event {
    fn from(signal: EntrySignal) -> Self {
        Event::EntrySignal(signal)
    }
}

impl From<PositionUpdate> for Event {
    fn from(update: PositionUpdate) -> Self {
        Event::PositionUpdate(update)
    }
}
