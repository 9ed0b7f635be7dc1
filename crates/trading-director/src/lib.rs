//! Event bus and trading director.
//!
//! Producers publish [`Event`](trading_core::types::Event)s onto a bounded
//! FIFO; a single [`TradingDirector`] consumes it and drives generators,
//! sizing, risk checks and order execution for each event in turn.

pub mod bus;
pub mod director;
pub mod execution;

#[cfg(test)]
mod testing;

use std::any::Any;

pub use bus::{channel, Envelope, EventPublisher, EventReceiver, DEFAULT_CAPACITY};
pub use director::{DirectorBuilder, DirectorStats, TradingDirector};
pub use execution::ExecutionPolicy;

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
