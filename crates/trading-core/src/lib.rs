//! Core types and traits for the trading system.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, Tick, SymbolInfo)
//! - The event model routed by the trading director
//! - Order, position and portfolio snapshot types
//! - Collaborator traits for generators, sizing, risk, execution, data and notifications

pub mod error;
pub mod traits;
pub mod types;

pub use error::{TradingError, TradingResult};
pub use traits::*;
pub use types::*;
