//! One-entry-per-day gating.

use chrono::NaiveDate;
use std::collections::HashMap;

/// Per-symbol record of the last day an entry signal was emitted.
///
/// Owned by a single generator instance; only advanced when that
/// generator emits an entry.
#[derive(Debug, Clone, Default)]
pub struct DailyEntryGate {
    last_trade_date: HashMap<String, NaiveDate>,
}

impl DailyEntryGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry may still be emitted for `symbol` on `today`.
    pub fn is_open(&self, symbol: &str, today: NaiveDate) -> bool {
        self.last_trade_date.get(symbol) != Some(&today)
    }

    /// Mark `symbol` as traded on `today`.
    pub fn record(&mut self, symbol: &str, today: NaiveDate) {
        self.last_trade_date.insert(symbol.to_string(), today);
    }
}
