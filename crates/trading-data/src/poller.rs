//! Publishes a market update whenever a new closed bar lands in the store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use trading_core::error::BusError;
use trading_core::traits::EventSink;
use trading_core::types::{MarketUpdate, Timeframe};

use crate::MarketDataStore;

/// Watches the store for new closed bars on subscribed series.
pub struct BarPoller {
    store: Arc<MarketDataStore>,
    sink: Arc<dyn EventSink>,
    subscriptions: Vec<(String, Timeframe)>,
    interval: Duration,
    last_seen: HashMap<(String, Timeframe), i64>,
}

impl BarPoller {
    pub fn new(store: Arc<MarketDataStore>, sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self {
            store,
            sink,
            subscriptions: Vec::new(),
            interval,
            last_seen: HashMap::new(),
        }
    }

    /// Watch `symbol` bars on `timeframe`. Duplicate subscriptions are ignored.
    pub fn subscribe(&mut self, symbol: &str, timeframe: Timeframe) {
        let key = (symbol.to_string(), timeframe);
        if !self.subscriptions.contains(&key) {
            self.subscriptions.push(key);
        }
    }

    pub fn subscriptions(&self) -> &[(String, Timeframe)] {
        &self.subscriptions
    }

    /// Check every subscription once and publish an update for each series
    /// with a bar not seen before. Returns the number published.
    pub async fn poll_once(&mut self) -> Result<usize, BusError> {
        let mut published = 0;
        for (symbol, timeframe) in &self.subscriptions {
            let Some(open) = self.store.latest_bar_time(symbol, *timeframe) else {
                continue;
            };
            let key = (symbol.clone(), *timeframe);
            if self.last_seen.get(&key).is_some_and(|seen| *seen >= open) {
                continue;
            }
            self.last_seen.insert(key, open);

            let closed_at = chrono::DateTime::from_timestamp_millis(open)
                .unwrap_or_default()
                + timeframe.duration();
            let update = MarketUpdate {
                symbol: symbol.clone(),
                timeframe: *timeframe,
                timestamp: closed_at,
            };
            debug!(symbol = %symbol, %timeframe, %closed_at, "new closed bar");
            self.sink.publish(update.into()).await?;
            published += 1;
        }
        Ok(published)
    }

    /// Poll until the bus closes or `shutdown` flips to true.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            subscriptions = self.subscriptions.len(),
            interval_ms = self.interval.as_millis() as u64,
            "bar poller started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        info!(error = %e, "bar poller stopping");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("bar poller stopped");
                        break;
                    }
                }
            }
        }
    }
}
