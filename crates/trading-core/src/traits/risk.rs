//! Position sizing and risk validation capabilities.

use rust_decimal::Decimal;

use crate::error::{RiskError, SizingError};
use crate::traits::{MarketDataProvider, PortfolioSource};
use crate::types::EntrySignal;

/// Converts an entry signal into a trade volume.
pub trait PositionSizing: Send + Sync {
    /// Volume in lots for `signal`.
    ///
    /// A volume that would be zero or below the broker minimum is reported
    /// as [`SizingError::BelowMinimum`], never returned.
    fn size(
        &self,
        signal: &EntrySignal,
        market_data: &dyn MarketDataProvider,
        portfolio: &dyn PortfolioSource,
    ) -> Result<Decimal, SizingError>;
}

/// Outcome of a risk check.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskVerdict {
    /// Proceed with the sized volume
    Approve,
    /// Drop the signal
    Reject { reason: String },
    /// Proceed with a smaller volume
    Adjust { volume: Decimal, reason: String },
}

/// Approves, rejects or scales a sized signal against portfolio limits.
pub trait RiskValidation: Send + Sync {
    /// Implementations must read a fresh snapshot from `portfolio`.
    fn validate(
        &self,
        signal: &EntrySignal,
        volume: Decimal,
        portfolio: &dyn PortfolioSource,
        market_data: &dyn MarketDataProvider,
    ) -> Result<RiskVerdict, RiskError>;
}
