//! Core data types for the trading system.

mod event;
mod market;
mod ohlcv;
mod order;
mod position;
mod timeframe;

pub use event::{EntrySignal, Event, MarketUpdate, PositionUpdate};
pub use market::{SymbolInfo, Tick};
pub use ohlcv::Bar;
pub use order::{OrderKind, OrderRequest, Side, Ticket, UpdateRequest};
pub use position::{PendingOrder, PortfolioSnapshot, Position, PositionCounts};
pub use timeframe::Timeframe;
