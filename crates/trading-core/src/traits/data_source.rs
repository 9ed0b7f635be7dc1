//! Market data provider trait.

use chrono::{DateTime, Utc};

use crate::error::DataError;
use crate::types::{Bar, SymbolInfo, Tick, Timeframe};

/// Read access to market data.
///
/// Implementations answer from local state filled by producers; none of
/// these calls may block on network I/O. Missing data is reported as a
/// [`DataError`], which callers treat as "skip this cycle".
pub trait MarketDataProvider: Send + Sync {
    /// Closed bars whose open time lies in `[start, end]`, oldest first.
    fn get_bars_from_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError>;

    /// The last `count` closed bars, oldest first.
    ///
    /// Fails with [`DataError::InsufficientBars`] when fewer are available.
    fn get_latest_closed_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError>;

    /// Most recent closed bar.
    fn get_latest_closed_bar(&self, symbol: &str, timeframe: Timeframe) -> Result<Bar, DataError> {
        self.get_latest_closed_bars(symbol, timeframe, 1)?
            .pop()
            .ok_or_else(|| DataError::NoBars {
                symbol: symbol.to_string(),
                timeframe,
            })
    }

    /// Latest bid/ask.
    fn get_latest_tick(&self, symbol: &str) -> Result<Tick, DataError>;

    /// Contract specification.
    fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, DataError>;
}
