//! Quotes and instrument metadata.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// Latest top-of-book quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    /// Price a new order on `side` fills at: ask for buys, bid for sells.
    pub fn entry_price(&self, side: Side) -> Decimal {
        match side {
            Side::Buy => self.ask,
            Side::Sell => self.bid,
        }
    }

    /// Price an open position on `side` closes at: bid for longs, ask for shorts.
    pub fn exit_price(&self, side: Side) -> Decimal {
        self.entry_price(side.opposite())
    }

    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// Contract specification for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    /// Smallest quoted increment (one "pip"/point)
    pub point: Decimal,
    /// Smallest price change used for P&L
    pub tick_size: Decimal,
    /// Account-currency value of one tick for one lot
    pub tick_value: Decimal,
    /// Units of the base asset in one lot
    pub contract_size: Decimal,
    pub volume_min: Decimal,
    pub volume_max: Decimal,
    pub volume_step: Decimal,
    /// Multiplier converting quote-currency amounts to account currency
    pub quote_to_account: Decimal,
}

impl SymbolInfo {
    /// Floor `volume` to the volume step and cap it at the maximum.
    /// Returns zero when the result falls below the minimum.
    pub fn normalize_volume(&self, volume: Decimal) -> Decimal {
        if volume <= Decimal::ZERO || self.volume_step <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let stepped = (volume / self.volume_step).floor() * self.volume_step;
        let capped = stepped.min(self.volume_max);
        if capped < self.volume_min {
            Decimal::ZERO
        } else {
            capped.normalize()
        }
    }

    /// Account-currency notional of `volume` lots at `price`.
    pub fn notional(&self, volume: Decimal, price: Decimal) -> Decimal {
        volume * self.contract_size * price * self.quote_to_account
    }

    /// Account-currency P&L of moving `distance` in price with `volume` lots.
    pub fn money_for_distance(&self, volume: Decimal, distance: Decimal) -> Decimal {
        if self.tick_size <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        distance / self.tick_size * self.tick_value * volume
    }
}
