//! Broker-side positions and the portfolio snapshot handed to the pipeline.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderKind, Side, SymbolInfo, Ticket};

/// An open position as reported by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticket: Ticket,
    pub symbol: String,
    pub side: Side,
    pub volume: Decimal,
    pub entry_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub magic_number: u64,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Floating P&L in account currency if closed at `exit_price`.
    pub fn profit_at(&self, exit_price: Decimal, info: &SymbolInfo) -> Decimal {
        let distance = (exit_price - self.entry_price) * self.side.sign();
        info.money_for_distance(self.volume, distance)
    }

    /// Whether the stop-loss is hit at `exit_price`.
    pub fn stop_hit(&self, exit_price: Decimal) -> bool {
        match (self.stop_loss, self.side) {
            (Some(sl), Side::Buy) => exit_price <= sl,
            (Some(sl), Side::Sell) => exit_price >= sl,
            (None, _) => false,
        }
    }

    /// Whether the take-profit is hit at `exit_price`.
    pub fn target_hit(&self, exit_price: Decimal) -> bool {
        match (self.take_profit, self.side) {
            (Some(tp), Side::Buy) => exit_price >= tp,
            (Some(tp), Side::Sell) => exit_price <= tp,
            (None, _) => false,
        }
    }
}

/// A limit or stop order waiting at the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub ticket: Ticket,
    pub symbol: String,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Decimal,
    pub volume: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub magic_number: u64,
}

impl PendingOrder {
    /// Whether the order triggers against a fresh entry-side quote.
    pub fn triggers_at(&self, entry_price: Decimal) -> bool {
        match (self.kind, self.side) {
            (OrderKind::Limit, Side::Buy) | (OrderKind::Stop, Side::Sell) => {
                entry_price <= self.price
            }
            (OrderKind::Limit, Side::Sell) | (OrderKind::Stop, Side::Buy) => {
                entry_price >= self.price
            }
            (OrderKind::Market, _) => true,
        }
    }
}

/// Long/short counts for one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionCounts {
    pub long: usize,
    pub short: usize,
}

impl PositionCounts {
    pub fn total(&self) -> usize {
        self.long + self.short
    }

    pub fn on(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.long,
            Side::Sell => self.short,
        }
    }
}

/// Consistent, read-only view of the account taken in one read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Magic number assigned to this trading instance
    pub magic_number: u64,
    pub balance: Decimal,
    /// Balance plus floating P&L
    pub equity: Decimal,
    pub positions: Vec<Position>,
    pub pending_orders: Vec<PendingOrder>,
}

impl PortfolioSnapshot {
    /// All open positions on the account, whoever owns them.
    pub fn get_open_positions(&self) -> &[Position] {
        &self.positions
    }

    /// Open positions opened by this instance.
    pub fn strategy_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions
            .iter()
            .filter(move |p| p.magic_number == self.magic_number)
    }

    /// Open positions of this instance on `symbol`.
    pub fn strategy_positions_for<'a>(
        &'a self,
        symbol: &'a str,
    ) -> impl Iterator<Item = &'a Position> + 'a {
        self.strategy_positions().filter(move |p| p.symbol == symbol)
    }

    /// Number of this instance's open positions on `symbol`.
    pub fn get_number_of_open_positions_by_symbol(&self, symbol: &str) -> usize {
        self.strategy_positions_for(symbol).count()
    }

    /// Long and short counts of this instance's positions on `symbol`.
    pub fn position_counts(&self, symbol: &str) -> PositionCounts {
        self.strategy_positions_for(symbol)
            .fold(PositionCounts::default(), |mut counts, p| {
                match p.side {
                    Side::Buy => counts.long += 1,
                    Side::Sell => counts.short += 1,
                }
                counts
            })
    }
}
