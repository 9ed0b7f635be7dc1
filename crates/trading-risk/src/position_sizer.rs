//! Position sizing algorithms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::{
    error::SizingError,
    traits::{MarketDataProvider, PortfolioSource, PositionSizing},
    types::EntrySignal,
};

/// Position sizing method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PositionSizingMethod {
    /// Broker minimum volume for the symbol
    Min,
    /// Fixed number of lots
    Fixed { volume: Decimal },
    /// Fraction of equity lost if the stop-loss is hit
    RiskPct { risk_pct: Decimal },
}

impl Default for PositionSizingMethod {
    fn default() -> Self {
        PositionSizingMethod::Min
    }
}

/// Position sizer calculates the volume of a new position.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    method: PositionSizingMethod,
}

impl PositionSizer {
    /// Create a new position sizer, validating the method's parameters.
    pub fn new(method: PositionSizingMethod) -> Result<Self, SizingError> {
        match &method {
            PositionSizingMethod::Min => {}
            PositionSizingMethod::Fixed { volume } => {
                if *volume <= Decimal::ZERO {
                    return Err(SizingError::InvalidConfig(format!(
                        "fixed volume must be positive, got {volume}"
                    )));
                }
            }
            PositionSizingMethod::RiskPct { risk_pct } => {
                if *risk_pct <= Decimal::ZERO || *risk_pct > Decimal::ONE {
                    return Err(SizingError::InvalidConfig(format!(
                        "risk_pct must be in (0, 1], got {risk_pct}"
                    )));
                }
            }
        }
        Ok(Self { method })
    }

    pub fn method(&self) -> &PositionSizingMethod {
        &self.method
    }

    fn risk_based(
        &self,
        risk_pct: Decimal,
        signal: &EntrySignal,
        market_data: &dyn MarketDataProvider,
        portfolio: &dyn PortfolioSource,
    ) -> Result<Decimal, SizingError> {
        let symbol = &signal.symbol;
        let stop_loss = signal
            .stop_loss
            .ok_or_else(|| SizingError::MissingStopLoss(symbol.clone()))?;

        let entry = match (signal.order_kind.is_pending(), signal.target_price) {
            (true, Some(price)) => price,
            _ => market_data.get_latest_tick(symbol)?.entry_price(signal.side),
        };

        let distance = (entry - stop_loss).abs();
        if distance.is_zero() {
            return Err(SizingError::ZeroStopDistance(symbol.clone()));
        }

        let info = market_data.symbol_info(symbol)?;
        let equity = portfolio.snapshot().equity;
        let risk_amount = equity * risk_pct;
        let loss_per_lot = info.money_for_distance(Decimal::ONE, distance);
        if loss_per_lot <= Decimal::ZERO || risk_amount <= Decimal::ZERO {
            return Err(SizingError::BelowMinimum {
                symbol: symbol.clone(),
                volume: Decimal::ZERO,
                minimum: info.volume_min,
            });
        }

        let raw = risk_amount / loss_per_lot;
        let volume = info.normalize_volume(raw);
        debug!(
            %symbol,
            %equity,
            %risk_amount,
            %distance,
            %raw,
            %volume,
            "risk-based size"
        );

        if volume.is_zero() {
            return Err(SizingError::BelowMinimum {
                symbol: symbol.clone(),
                volume: raw,
                minimum: info.volume_min,
            });
        }
        Ok(volume)
    }
}

impl PositionSizing for PositionSizer {
    fn size(
        &self,
        signal: &EntrySignal,
        market_data: &dyn MarketDataProvider,
        portfolio: &dyn PortfolioSource,
    ) -> Result<Decimal, SizingError> {
        match &self.method {
            PositionSizingMethod::Min => {
                let info = market_data.symbol_info(&signal.symbol)?;
                if info.volume_min <= Decimal::ZERO {
                    return Err(SizingError::BelowMinimum {
                        symbol: signal.symbol.clone(),
                        volume: info.volume_min,
                        minimum: info.volume_min,
                    });
                }
                Ok(info.volume_min)
            }
            PositionSizingMethod::Fixed { volume } => {
                let info = market_data.symbol_info(&signal.symbol)?;
                if *volume < info.volume_min {
                    return Err(SizingError::BelowMinimum {
                        symbol: signal.symbol.clone(),
                        volume: *volume,
                        minimum: info.volume_min,
                    });
                }
                Ok(*volume)
            }
            PositionSizingMethod::RiskPct { risk_pct } => {
                self.risk_based(*risk_pct, signal, market_data, portfolio)
            }
        }
    }
}
