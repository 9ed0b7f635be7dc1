//! Paper trading broker for simulation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trading_core::error::ExecutionError;
use trading_core::traits::{MarketDataProvider, OrderExecutor, PortfolioSource, TickListener};
use trading_core::types::{
    OrderKind, OrderRequest, PendingOrder, PortfolioSnapshot, Position, Side, Tick, Ticket,
    UpdateRequest,
};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    Requested,
}

/// A position that has been closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub ticket: Ticket,
    pub symbol: String,
    pub side: Side,
    pub volume: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub profit: Decimal,
    pub reason: CloseReason,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Ledger {
    balance: Decimal,
    positions: Vec<Position>,
    pending: Vec<PendingOrder>,
    closed: Vec<ClosedTrade>,
}

/// Paper trading broker for simulation.
///
/// Fills market orders at the latest quote, holds limit/stop orders until a
/// tick triggers them and closes positions whose stop or target is hit.
pub struct PaperBroker {
    market_data: Arc<dyn MarketDataProvider>,
    ledger: RwLock<Ledger>,
    magic_number: u64,
    next_ticket: AtomicU64,
    commission_per_lot: Decimal,
}

impl PaperBroker {
    /// Create a new paper broker with an initial balance.
    pub fn new(magic_number: u64, initial_balance: Decimal, market_data: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            market_data,
            ledger: RwLock::new(Ledger {
                balance: initial_balance,
                ..Default::default()
            }),
            magic_number,
            next_ticket: AtomicU64::new(1),
            commission_per_lot: Decimal::ZERO,
        }
    }

    /// Set commission charged per lot on close.
    pub fn with_commission(mut self, per_lot: Decimal) -> Self {
        self.commission_per_lot = per_lot;
        self
    }

    pub fn closed_trades(&self) -> Vec<ClosedTrade> {
        self.ledger.read().closed.clone()
    }

    fn ticket(&self) -> Ticket {
        self.next_ticket.fetch_add(1, Ordering::Relaxed)
    }

    fn check_stops(side: Side, reference: Decimal, request: &OrderRequest) -> Result<(), ExecutionError> {
        let sign = side.sign();
        if let Some(sl) = request.stop_loss {
            if (reference - sl) * sign <= Decimal::ZERO {
                return Err(ExecutionError::InvalidRequest(format!(
                    "stop-loss {sl} is on the wrong side of {reference} for {side}"
                )));
            }
        }
        if let Some(tp) = request.take_profit {
            if (tp - reference) * sign <= Decimal::ZERO {
                return Err(ExecutionError::InvalidRequest(format!(
                    "take-profit {tp} is on the wrong side of {reference} for {side}"
                )));
            }
        }
        Ok(())
    }

    /// Remove the position at `index` and book its P&L.
    fn close_at(&self, ledger: &mut Ledger, index: usize, exit_price: Decimal, reason: CloseReason, at: DateTime<Utc>) -> Ticket {
        let position = ledger.positions.remove(index);
        let profit = match self.market_data.symbol_info(&position.symbol) {
            Ok(info) => position.profit_at(exit_price, &info),
            Err(e) => {
                warn!(ticket = position.ticket, error = %e, "no symbol info, booking zero profit");
                Decimal::ZERO
            }
        } - self.commission_per_lot * position.volume;

        ledger.balance += profit;
        info!(
            ticket = position.ticket,
            symbol = %position.symbol,
            side = %position.side,
            %exit_price,
            %profit,
            ?reason,
            "position closed"
        );
        ledger.closed.push(ClosedTrade {
            ticket: position.ticket,
            symbol: position.symbol,
            side: position.side,
            volume: position.volume,
            entry_price: position.entry_price,
            exit_price,
            profit,
            reason,
            closed_at: at,
        });
        position.ticket
    }
}

#[async_trait]
impl OrderExecutor for PaperBroker {
    async fn submit_order(&self, request: OrderRequest) -> Result<Ticket, ExecutionError> {
        if request.volume <= Decimal::ZERO {
            return Err(ExecutionError::InvalidRequest(format!(
                "volume must be positive, got {}",
                request.volume
            )));
        }
        let info = self
            .market_data
            .symbol_info(&request.symbol)
            .map_err(|e| ExecutionError::InvalidRequest(e.to_string()))?;
        if request.volume < info.volume_min || request.volume > info.volume_max {
            return Err(ExecutionError::InvalidRequest(format!(
                "volume {} outside [{}, {}]",
                request.volume, info.volume_min, info.volume_max
            )));
        }
        let tick = self
            .market_data
            .get_latest_tick(&request.symbol)
            .map_err(|e| ExecutionError::Rejected(e.to_string()))?;

        let ticket = self.ticket();
        match request.kind {
            OrderKind::Market => {
                let fill_price = tick.entry_price(request.side);
                Self::check_stops(request.side, fill_price, &request)?;
                let position = Position {
                    ticket,
                    symbol: request.symbol.clone(),
                    side: request.side,
                    volume: request.volume,
                    entry_price: fill_price,
                    stop_loss: request.stop_loss,
                    take_profit: request.take_profit,
                    magic_number: request.magic_number,
                    opened_at: tick.timestamp,
                };
                info!(
                    ticket,
                    symbol = %request.symbol,
                    side = %request.side,
                    volume = %request.volume,
                    %fill_price,
                    "market order filled"
                );
                self.ledger.write().positions.push(position);
            }
            kind => {
                let price = request.price.ok_or_else(|| {
                    ExecutionError::InvalidRequest(format!("{kind} order without a price"))
                })?;
                Self::check_stops(request.side, price, &request)?;
                info!(ticket, symbol = %request.symbol, %kind, %price, "pending order placed");
                self.ledger.write().pending.push(PendingOrder {
                    ticket,
                    symbol: request.symbol.clone(),
                    side: request.side,
                    kind,
                    price,
                    volume: request.volume,
                    stop_loss: request.stop_loss,
                    take_profit: request.take_profit,
                    magic_number: request.magic_number,
                });
            }
        }
        Ok(ticket)
    }

    async fn modify_order(&self, request: UpdateRequest) -> Result<(), ExecutionError> {
        let mut ledger = self.ledger.write();
        if let Some(position) = ledger.positions.iter_mut().find(|p| p.ticket == request.ticket) {
            debug!(
                ticket = request.ticket,
                old_stop = ?position.stop_loss,
                new_stop = %request.new_stop_loss,
                "position modified"
            );
            position.stop_loss = Some(request.new_stop_loss);
            if request.take_profit.is_some() {
                position.take_profit = request.take_profit;
            }
            return Ok(());
        }
        if let Some(order) = ledger.pending.iter_mut().find(|o| o.ticket == request.ticket) {
            order.stop_loss = Some(request.new_stop_loss);
            if request.take_profit.is_some() {
                order.take_profit = request.take_profit;
            }
            return Ok(());
        }
        Err(ExecutionError::PositionNotFound(request.ticket))
    }

    async fn close_positions(
        &self,
        symbol: &str,
        side: Side,
        magic_number: u64,
    ) -> Result<Vec<Ticket>, ExecutionError> {
        let tick = self
            .market_data
            .get_latest_tick(symbol)
            .map_err(|e| ExecutionError::Rejected(e.to_string()))?;
        let exit_price = tick.exit_price(side);

        let mut ledger = self.ledger.write();
        let mut closed = Vec::new();
        while let Some(index) = ledger
            .positions
            .iter()
            .position(|p| p.symbol == symbol && p.side == side && p.magic_number == magic_number)
        {
            closed.push(self.close_at(&mut ledger, index, exit_price, CloseReason::Requested, tick.timestamp));
        }
        Ok(closed)
    }

    fn name(&self) -> &str {
        "paper"
    }
}

impl PortfolioSource for PaperBroker {
    fn snapshot(&self) -> PortfolioSnapshot {
        let ledger = self.ledger.read();
        let floating: Decimal = ledger
            .positions
            .iter()
            .filter_map(|p| {
                let tick = self.market_data.get_latest_tick(&p.symbol).ok()?;
                let info = self.market_data.symbol_info(&p.symbol).ok()?;
                Some(p.profit_at(tick.exit_price(p.side), &info))
            })
            .sum();

        PortfolioSnapshot {
            magic_number: self.magic_number,
            balance: ledger.balance,
            equity: ledger.balance + floating,
            positions: ledger.positions.clone(),
            pending_orders: ledger.pending.clone(),
        }
    }

    fn magic_number(&self) -> u64 {
        self.magic_number
    }
}

impl TickListener for PaperBroker {
    /// Trigger pending orders, then close positions whose stop or target
    /// the tick reaches.
    fn on_tick(&self, tick: &Tick) {
        let mut ledger = self.ledger.write();

        let (triggered, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut ledger.pending)
            .into_iter()
            .partition(|o| o.symbol == tick.symbol && o.triggers_at(tick.entry_price(o.side)));
        ledger.pending = waiting;
        for order in triggered {
            info!(ticket = order.ticket, symbol = %order.symbol, price = %order.price, "pending order triggered");
            ledger.positions.push(Position {
                ticket: order.ticket,
                symbol: order.symbol,
                side: order.side,
                volume: order.volume,
                entry_price: order.price,
                stop_loss: order.stop_loss,
                take_profit: order.take_profit,
                magic_number: order.magic_number,
                opened_at: tick.timestamp,
            });
        }

        let mut index = 0;
        while index < ledger.positions.len() {
            let position = &ledger.positions[index];
            if position.symbol != tick.symbol {
                index += 1;
                continue;
            }
            let price = tick.exit_price(position.side);
            let exit = if position.stop_hit(price) {
                position.stop_loss.map(|sl| (sl, CloseReason::StopLoss))
            } else if position.target_hit(price) {
                position.take_profit.map(|tp| (tp, CloseReason::TakeProfit))
            } else {
                None
            };
            match exit {
                Some((level, reason)) => {
                    self.close_at(&mut ledger, index, level, reason, tick.timestamp);
                }
                None => index += 1,
            }
        }
    }
}
