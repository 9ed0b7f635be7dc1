//! Market data for the trading director.
//!
//! The [`MarketDataStore`] answers every read the pipeline makes. Producers
//! fill it: [`CsvDataSource`] seeds history, [`RandomWalkFeed`] generates
//! paper ticks and bars, and [`BarPoller`] turns new closed bars into
//! market updates on the event bus.

mod csv_source;
mod poller;
mod store;
mod synthetic;

pub use csv_source::CsvDataSource;
pub use poller::BarPoller;
pub use store::{MarketDataStore, DEFAULT_MAX_BARS};
pub use synthetic::{RandomWalkConfig, RandomWalkFeed};
