//! Error types for the trading system.

use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use crate::types::{Ticket, Timeframe};

/// Top-level trading system error.
///
/// Every pipeline stage reports through one of the nested variants; the
/// director logs them and drops the offending event.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Data unavailable: {0}")]
    Data(#[from] DataError),

    #[error("Sizing rejected: {0}")]
    Sizing(#[from] SizingError),

    #[error("Risk check failed: {0}")]
    Risk(#[from] RiskError),

    #[error("Execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Stage panicked: {0}")]
    Panicked(String),
}

impl TradingError {
    /// Short, stable name used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            TradingError::InvalidConfiguration(_) => "invalid_configuration",
            TradingError::Strategy(StrategyError::Data(_)) | TradingError::Data(_) => {
                "data_unavailable"
            }
            TradingError::Strategy(_) => "strategy",
            TradingError::Sizing(_) => "sizing_rejected",
            TradingError::Risk(_) => "risk",
            TradingError::Execution(_) => "execution_failed",
            TradingError::Panicked(_) => "panicked",
        }
    }

    /// Whether this error only means "skip this cycle".
    pub fn is_data_unavailable(&self) -> bool {
        self.kind() == "data_unavailable"
    }
}

/// Signal generator errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Strategy not found: {0}")]
    NotFound(String),
}

/// Market data errors. All of them are recoverable: the cycle is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No {timeframe} bars for {symbol} in the requested range")]
    NoBars { symbol: String, timeframe: Timeframe },

    #[error("Insufficient data for {symbol}: need {required} bars, have {available}")]
    InsufficientBars {
        symbol: String,
        required: usize,
        available: usize,
    },

    #[error("No tick available for {0}")]
    NoTick(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Position sizing errors. Any of them drops the signal.
#[derive(Error, Debug)]
pub enum SizingError {
    #[error("Invalid sizing configuration: {0}")]
    InvalidConfig(String),

    #[error("Volume {volume} for {symbol} is below the broker minimum {minimum}")]
    BelowMinimum {
        symbol: String,
        volume: Decimal,
        minimum: Decimal,
    },

    #[error("Signal for {0} carries no stop-loss, risk-based sizing needs one")]
    MissingStopLoss(String),

    #[error("Stop-loss for {0} sits at the entry price")]
    ZeroStopDistance(String),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Errors raised while evaluating a risk verdict.
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid risk configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Order executor errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Executor call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited: retry after {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Position not found: {0}")]
    PositionNotFound(Ticket),

    #[error("Price moved {moved} points since the first attempt, not retrying")]
    PriceContextChanged { moved: Decimal },
}

impl ExecutionError {
    /// Transport-level failures that may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExecutionError::Connection(_)
                | ExecutionError::Timeout(_)
                | ExecutionError::RateLimited { .. }
        )
    }
}

/// Event bus errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("Event bus is full")]
    Full,
}

/// Result type alias for trading operations.
pub type TradingResult<T> = Result<T, TradingError>;
