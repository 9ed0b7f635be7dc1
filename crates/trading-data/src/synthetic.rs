//! Random-walk tick feed for paper trading.
//!
//! Generates bid/ask ticks on a simulated clock, hands them to listeners
//! (the paper broker) and rolls them into closed bars in the store.

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use trading_core::traits::TickListener;
use trading_core::types::{Bar, SymbolInfo, Tick, Timeframe};

use crate::MarketDataStore;

/// Random-walk feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkConfig {
    /// Price every symbol starts from
    pub start_price: f64,
    /// Largest relative move per tick
    pub volatility: f64,
    /// Spread in points
    pub spread_points: u32,
    /// Wall-clock pause between ticks
    pub tick_interval_ms: u64,
    /// Simulated seconds that pass per tick
    pub sim_seconds_per_tick: i64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            start_price: 1.1,
            volatility: 0.0005,
            spread_points: 2,
            tick_interval_ms: 250,
            sim_seconds_per_tick: 30,
            seed: None,
        }
    }
}

struct Walk {
    info: SymbolInfo,
    price: f64,
    forming: Option<Bar>,
}

/// Random-walk tick and bar producer.
pub struct RandomWalkFeed {
    store: Arc<MarketDataStore>,
    timeframe: Timeframe,
    config: RandomWalkConfig,
    walks: Vec<Walk>,
    listeners: Vec<Arc<dyn TickListener>>,
    clock: DateTime<Utc>,
    rng: StdRng,
}

impl RandomWalkFeed {
    pub fn new(
        store: Arc<MarketDataStore>,
        timeframe: Timeframe,
        config: RandomWalkConfig,
        start: DateTime<Utc>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            timeframe,
            config,
            walks: Vec::new(),
            listeners: Vec::new(),
            clock: start,
            rng,
        }
    }

    /// Add a symbol; its spec is registered with the store.
    pub fn add_symbol(&mut self, info: SymbolInfo) {
        self.store.set_symbol_info(info.clone());
        self.walks.push(Walk {
            info,
            price: self.config.start_price,
            forming: None,
        });
    }

    pub fn add_listener(&mut self, listener: Arc<dyn TickListener>) {
        self.listeners.push(listener);
    }

    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    /// Advance the simulated clock one tick and emit a tick per symbol.
    pub fn step(&mut self) -> Vec<Tick> {
        self.clock += TimeDelta::seconds(self.config.sim_seconds_per_tick.max(1));
        let bar_open = self.timeframe.bar_open(self.clock).timestamp_millis();

        let mut ticks = Vec::with_capacity(self.walks.len());
        for walk in &mut self.walks {
            let shock: f64 = self.rng.gen_range(-1.0..=1.0);
            walk.price = (walk.price * (1.0 + self.config.volatility * shock)).max(f64::EPSILON);

            match walk.forming.as_mut() {
                Some(bar) if bar.timestamp == bar_open => bar.absorb(walk.price),
                _ => {
                    if let Some(closed) = walk.forming.take() {
                        self.store.record_bar(&walk.info.symbol, self.timeframe, closed);
                    }
                    walk.forming = Some(Bar::new(
                        bar_open, walk.price, walk.price, walk.price, walk.price, 1.0,
                    ));
                }
            }

            let digits = walk.info.point.normalize().scale();
            let bid = Decimal::try_from(walk.price)
                .unwrap_or_default()
                .round_dp(digits);
            let spread = Decimal::from(self.config.spread_points) * walk.info.point;
            ticks.push(Tick {
                symbol: walk.info.symbol.clone(),
                bid,
                ask: bid + spread,
                timestamp: self.clock,
            });
        }

        for tick in &ticks {
            self.store.record_tick(tick.clone());
            for listener in &self.listeners {
                listener.on_tick(tick);
            }
        }
        ticks
    }

    /// Produce ticks until `shutdown` flips to true.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            symbols = self.walks.len(),
            timeframe = %self.timeframe,
            "random walk feed started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let ticks = self.step();
                    debug!(count = ticks.len(), clock = %self.clock, "ticks generated");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("random walk feed stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use trading_core::traits::MarketDataProvider;

    fn eurusd() -> SymbolInfo {
        SymbolInfo {
            symbol: "EURUSD".to_string(),
            point: dec!(0.00001),
            tick_size: dec!(0.00001),
            tick_value: dec!(1),
            contract_size: dec!(100000),
            volume_min: dec!(0.01),
            volume_max: dec!(100),
            volume_step: dec!(0.01),
            quote_to_account: dec!(1),
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Tick>>);

    impl TickListener for Recorder {
        fn on_tick(&self, tick: &Tick) {
            self.0.lock().push(tick.clone());
        }
    }

    fn feed(store: Arc<MarketDataStore>) -> RandomWalkFeed {
        let config = RandomWalkConfig {
            seed: Some(7),
            sim_seconds_per_tick: 60,
            ..Default::default()
        };
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let mut feed = RandomWalkFeed::new(store, Timeframe::Minute5, config, start);
        feed.add_symbol(eurusd());
        feed
    }

    #[test]
    fn test_ticks_reach_store_and_listeners() {
        let store = Arc::new(MarketDataStore::new());
        let recorder = Arc::new(Recorder::default());
        let mut feed = feed(store.clone());
        feed.add_listener(recorder.clone());

        let ticks = feed.step();
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].ask - ticks[0].bid, dec!(0.00002));
        assert_eq!(store.get_latest_tick("EURUSD").unwrap(), ticks[0]);
        assert_eq!(recorder.0.lock().len(), 1);
        assert!(store.symbol_info("EURUSD").is_ok());
    }

    #[test]
    fn test_bars_close_on_boundary() {
        let store = Arc::new(MarketDataStore::new());
        let mut feed = feed(store.clone());

        // 09:01 .. 09:04 all belong to the 09:00 bar
        for _ in 0..4 {
            feed.step();
        }
        assert_eq!(store.bar_count("EURUSD", Timeframe::Minute5), 0);

        // 09:05 opens the next bar and closes the first
        feed.step();
        let closed = store
            .get_latest_closed_bar("EURUSD", Timeframe::Minute5)
            .unwrap();
        assert_eq!(
            closed.timestamp,
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap().timestamp_millis()
        );
        assert!(closed.high >= closed.low);
        assert_eq!(closed.volume, 4.0);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = feed(Arc::new(MarketDataStore::new()));
        let mut b = feed(Arc::new(MarketDataStore::new()));
        for _ in 0..10 {
            assert_eq!(a.step(), b.step());
        }
    }
}
