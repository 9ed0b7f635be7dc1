//! Order types and requests sent to the executor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EntrySignal, PositionUpdate};

/// Broker ticket identifying a position or pending order.
pub type Ticket = u64;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for buy, -1 for sell. Multiplying a price move by this gives the
    /// move in the trade's favour.
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => -Decimal::ONE,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// How an entry should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    /// Fill immediately at the current quote
    #[default]
    Market,
    /// Fill at the target price or better
    Limit,
    /// Fill once price trades through the target price
    Stop,
}

impl OrderKind {
    pub fn is_pending(&self) -> bool {
        !matches!(self, OrderKind::Market)
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderKind::Market => write!(f, "MARKET"),
            OrderKind::Limit => write!(f, "LIMIT"),
            OrderKind::Stop => write!(f, "STOP"),
        }
    }
}

/// New order submitted to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub kind: OrderKind,
    pub symbol: String,
    pub side: Side,
    pub volume: Decimal,
    /// Trigger/limit price for pending orders
    pub price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub magic_number: u64,
}

impl OrderRequest {
    /// Build the order for a sized and approved entry signal.
    pub fn from_signal(signal: &EntrySignal, volume: Decimal) -> Self {
        Self {
            kind: signal.order_kind,
            symbol: signal.symbol.clone(),
            side: signal.side,
            volume,
            price: signal.target_price.filter(|_| signal.order_kind.is_pending()),
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            magic_number: signal.magic_number,
        }
    }
}

/// In-place stop/target change for an open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub ticket: Ticket,
    pub symbol: String,
    pub new_stop_loss: Decimal,
    pub take_profit: Option<Decimal>,
}

impl From<&PositionUpdate> for UpdateRequest {
    fn from(update: &PositionUpdate) -> Self {
        Self {
            ticket: update.ticket,
            symbol: update.symbol.clone(),
            new_stop_loss: update.new_stop_loss,
            take_profit: update.take_profit,
        }
    }
}
