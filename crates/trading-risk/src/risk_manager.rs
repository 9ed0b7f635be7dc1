//! Maximum leverage risk manager.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trading_core::{
    error::RiskError,
    traits::{MarketDataProvider, PortfolioSource, RiskValidation, RiskVerdict},
    types::EntrySignal,
};

/// Risk management configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Aggregate notional may not exceed this multiple of equity
    pub max_leverage_factor: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_leverage_factor: Decimal::from(5),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.max_leverage_factor <= Decimal::ZERO {
            return Err(RiskError::InvalidConfig(format!(
                "max_leverage_factor must be positive, got {}",
                self.max_leverage_factor
            )));
        }
        Ok(())
    }
}

/// Caps account leverage across open positions, pending orders and the
/// candidate order.
#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
}

impl RiskManager {
    /// Create a new risk manager.
    pub fn new(config: RiskConfig) -> Result<Self, RiskError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Account-currency notional already committed on the account.
    fn committed_notional(
        &self,
        snapshot: &trading_core::types::PortfolioSnapshot,
        market_data: &dyn MarketDataProvider,
    ) -> Result<Decimal, RiskError> {
        let positions = snapshot
            .get_open_positions()
            .iter()
            .map(|p| (p.symbol.as_str(), p.volume, p.entry_price));
        let pending = snapshot
            .pending_orders
            .iter()
            .map(|o| (o.symbol.as_str(), o.volume, o.price));

        positions
            .chain(pending)
            .try_fold(Decimal::ZERO, |total, (symbol, volume, price)| {
                let info = market_data.symbol_info(symbol)?;
                Ok(total + info.notional(volume, price))
            })
    }
}

impl RiskValidation for RiskManager {
    fn validate(
        &self,
        signal: &EntrySignal,
        volume: Decimal,
        portfolio: &dyn PortfolioSource,
        market_data: &dyn MarketDataProvider,
    ) -> Result<RiskVerdict, RiskError> {
        let snapshot = portfolio.snapshot();
        if snapshot.equity <= Decimal::ZERO {
            return Ok(RiskVerdict::Reject {
                reason: format!("equity {} is not positive", snapshot.equity),
            });
        }

        let info = market_data.symbol_info(&signal.symbol)?;
        let price = match (signal.order_kind.is_pending(), signal.target_price) {
            (true, Some(price)) => price,
            _ => market_data.get_latest_tick(&signal.symbol)?.entry_price(signal.side),
        };

        let committed = self.committed_notional(&snapshot, market_data)?;
        let candidate = info.notional(volume, price);
        let limit = snapshot.equity * self.config.max_leverage_factor;
        let leverage = (committed + candidate) / snapshot.equity;

        debug!(
            symbol = %signal.symbol,
            %committed,
            %candidate,
            %limit,
            %leverage,
            "leverage check"
        );

        if committed + candidate <= limit {
            return Ok(RiskVerdict::Approve);
        }

        let per_lot = info.notional(Decimal::ONE, price);
        let headroom = limit - committed;
        if headroom <= Decimal::ZERO || per_lot <= Decimal::ZERO {
            warn!(symbol = %signal.symbol, %leverage, "leverage limit reached");
            return Ok(RiskVerdict::Reject {
                reason: format!(
                    "leverage {:.2} exceeds max {}",
                    leverage.round_dp(2),
                    self.config.max_leverage_factor
                ),
            });
        }

        let scaled = info.normalize_volume((headroom / per_lot).min(volume));
        if scaled.is_zero() {
            return Ok(RiskVerdict::Reject {
                reason: format!(
                    "volume that fits the leverage limit is below the minimum {}",
                    info.volume_min
                ),
            });
        }

        Ok(RiskVerdict::Adjust {
            volume: scaled,
            reason: format!(
                "scaled from {volume} to {scaled} to keep leverage within {}",
                self.config.max_leverage_factor
            ),
        })
    }
}
