//! Order execution backends.
//!
//! The [`PaperBroker`] keeps a simulated account: it implements the order
//! executor, the portfolio snapshot source and a tick listener that fires
//! stops, targets and pending orders.

mod paper;

pub use paper::{CloseReason, ClosedTrade, PaperBroker};
