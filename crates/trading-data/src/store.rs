//! In-memory market data store.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use trading_core::error::DataError;
use trading_core::traits::MarketDataProvider;
use trading_core::types::{Bar, SymbolInfo, Tick, Timeframe};

/// Default number of closed bars kept per symbol and timeframe.
pub const DEFAULT_MAX_BARS: usize = 5_000;

#[derive(Default)]
struct StoreState {
    bars: HashMap<(String, Timeframe), Vec<Bar>>,
    ticks: HashMap<String, Tick>,
    symbols: HashMap<String, SymbolInfo>,
}

/// Closed bars, latest ticks and contract specs, filled by producers and
/// read by the pipeline.
///
/// Readers never block on I/O; they take a read lock and copy out.
pub struct MarketDataStore {
    state: RwLock<StoreState>,
    max_bars: usize,
}

impl MarketDataStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_BARS)
    }

    /// Create a store keeping at most `max_bars` bars per series.
    pub fn with_capacity(max_bars: usize) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            max_bars: max_bars.max(1),
        }
    }

    pub fn set_symbol_info(&self, info: SymbolInfo) {
        self.state.write().symbols.insert(info.symbol.clone(), info);
    }

    pub fn record_tick(&self, tick: Tick) {
        self.state.write().ticks.insert(tick.symbol.clone(), tick);
    }

    /// Record a closed bar. A bar with the timestamp of the last one
    /// replaces it; older bars are merged in order.
    pub fn record_bar(&self, symbol: &str, timeframe: Timeframe, bar: Bar) {
        let mut state = self.state.write();
        let series = state
            .bars
            .entry((symbol.to_string(), timeframe))
            .or_default();

        match series.last().map(|b| b.timestamp) {
            Some(last) if last == bar.timestamp => {
                if let Some(slot) = series.last_mut() {
                    *slot = bar;
                }
            }
            Some(last) if last > bar.timestamp => {
                match series.binary_search_by_key(&bar.timestamp, |b| b.timestamp) {
                    Ok(i) => series[i] = bar,
                    Err(i) => series.insert(i, bar),
                }
            }
            _ => series.push(bar),
        }
        Self::trim(series, self.max_bars);
    }

    /// Merge a batch of closed bars, e.g. history loaded at startup.
    pub fn extend_bars(&self, symbol: &str, timeframe: Timeframe, bars: impl IntoIterator<Item = Bar>) {
        let mut state = self.state.write();
        let series = state
            .bars
            .entry((symbol.to_string(), timeframe))
            .or_default();
        series.extend(bars);
        series.sort_by_key(|b| b.timestamp);
        series.dedup_by_key(|b| b.timestamp);
        Self::trim(series, self.max_bars);
    }

    /// Open time in milliseconds of the newest closed bar.
    pub fn latest_bar_time(&self, symbol: &str, timeframe: Timeframe) -> Option<i64> {
        self.state
            .read()
            .bars
            .get(&(symbol.to_string(), timeframe))
            .and_then(|series| series.last())
            .map(|bar| bar.timestamp)
    }

    pub fn bar_count(&self, symbol: &str, timeframe: Timeframe) -> usize {
        self.state
            .read()
            .bars
            .get(&(symbol.to_string(), timeframe))
            .map_or(0, Vec::len)
    }

    fn trim(series: &mut Vec<Bar>, max_bars: usize) {
        if series.len() > max_bars {
            let excess = series.len() - max_bars;
            series.drain(..excess);
        }
    }
}

impl Default for MarketDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataProvider for MarketDataStore {
    fn get_bars_from_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let (start, end) = (start.timestamp_millis(), end.timestamp_millis());
        let state = self.state.read();
        let bars: Vec<Bar> = state
            .bars
            .get(&(symbol.to_string(), timeframe))
            .map(|series| {
                series
                    .iter()
                    .filter(|b| b.timestamp >= start && b.timestamp <= end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();

        if bars.is_empty() {
            return Err(DataError::NoBars {
                symbol: symbol.to_string(),
                timeframe,
            });
        }
        Ok(bars)
    }

    fn get_latest_closed_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let state = self.state.read();
        let series = state
            .bars
            .get(&(symbol.to_string(), timeframe))
            .map(Vec::as_slice)
            .unwrap_or_default();

        if series.len() < count {
            return Err(DataError::InsufficientBars {
                symbol: symbol.to_string(),
                required: count,
                available: series.len(),
            });
        }
        Ok(series[series.len() - count..].to_vec())
    }

    fn get_latest_tick(&self, symbol: &str) -> Result<Tick, DataError> {
        self.state
            .read()
            .ticks
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::NoTick(symbol.to_string()))
    }

    fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, DataError> {
        self.state
            .read()
            .symbols
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
    }
}
